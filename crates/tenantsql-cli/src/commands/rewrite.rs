//! `tenantsql rewrite` command implementation.

use std::io::Read;

use anyhow::{Context, Result};
use serde_json::Value;
use tenantsql_core::TenantId;
use tenantsql_rewrite::RewrittenStatement;

use super::{Outcome, Session, report_rejection};

pub async fn run(
    session: &Session,
    tenant: &TenantId,
    sql: Option<String>,
    params: &[String],
    json: bool,
) -> Result<Outcome> {
    let sql = match sql {
        Some(sql) => sql,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read SQL from stdin")?;
            buf
        }
    };

    let outcome = session.rewriter.rewrite(&sql, tenant);
    session
        .audit
        .log_outcome(tenant, &outcome)
        .await
        .context("Failed to record audit event")?;

    match outcome {
        Ok(rewritten) => {
            println!("{}", render(&rewritten, &parse_params(params), json)?);
            Ok(Outcome::Accepted)
        }
        Err(err) => {
            report_rejection(&err.to_rejection(), json)?;
            Ok(Outcome::Rejected)
        }
    }
}

/// Parameters are JSON when they parse as JSON, strings otherwise.
pub fn parse_params(raw: &[String]) -> Vec<Value> {
    raw.iter()
        .map(|p| serde_json::from_str(p).unwrap_or_else(|_| Value::String(p.clone())))
        .collect()
}

fn render(rewritten: &RewrittenStatement, params: &[Value], json: bool) -> Result<String> {
    if !json {
        return Ok(rewritten.sql.clone());
    }
    let payload = serde_json::json!({
        "sql": rewritten.sql,
        "kind": rewritten.kind,
        "references": rewritten.references,
        "params": params,
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}
