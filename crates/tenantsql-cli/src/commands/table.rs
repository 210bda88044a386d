//! `tenantsql create-table`, `drop-table` and `preview` command implementations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tenantsql_core::TenantId;
use tenantsql_rewrite::{ExecutionRequest, StatementKind, TableDefinition};

use super::{Outcome, Session, render_request, report_rejection};

/// Render CREATE TABLE for the definition stored at `path`.
pub async fn create(
    session: &Session,
    tenant: &TenantId,
    path: &Path,
    json: bool,
) -> Result<Outcome> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table definition {}", path.display()))?;
    let definition: TableDefinition = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse table definition {}", path.display()))?;

    let outcome = session.rewriter.create_table(&definition, tenant);
    session
        .audit
        .log_outcome(tenant, &outcome)
        .await
        .context("Failed to record audit event")?;

    match outcome {
        Ok(rewritten) => {
            let request = ExecutionRequest::new(rewritten.sql, Vec::new());
            println!("{}", render_request(&request, json)?);
            Ok(Outcome::Accepted)
        }
        Err(err) => {
            report_rejection(&err.to_rejection(), json)?;
            Ok(Outcome::Rejected)
        }
    }
}

pub async fn drop(session: &Session, tenant: &TenantId, table: &str, json: bool) -> Result<Outcome> {
    let request = session.rewriter.drop_table(table, tenant);
    session
        .emit_request(tenant, StatementKind::DropTable, request, json)
        .await
}

pub async fn preview(
    session: &Session,
    tenant: &TenantId,
    table: &str,
    json: bool,
) -> Result<Outcome> {
    let request = session.rewriter.preview_rows(table, tenant);
    session
        .emit_request(tenant, StatementKind::Select, request, json)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::file_session;
    use tenantsql_audit::{AuditEventType, AuditFilter};
    use tenantsql_core::{StorageBackend, TenantSqlConfig};
    use tenantsql_rewrite::RejectionKind;

    fn write_definition(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("orders.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn test_create_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = file_session(&dir);
        let path = write_definition(
            &dir,
            r#"{
                "tablename": "orders",
                "cols": [
                    {"name": "id", "type": "SERIAL", "constraints": "PRIMARY KEY"},
                    {"name": "total", "type": "NUMERIC(10,2)", "constraints": ["NOT NULL"]}
                ]
            }"#,
        );

        let outcome = create(&session, &TenantId::from(7u64), &path, false)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Accepted);

        let events = session.audit.query(AuditFilter::default()).await.unwrap();
        assert_eq!(events[0].event_type, AuditEventType::StatementRewritten);
        assert_eq!(events[0].statement_kind, Some(StatementKind::CreateTable));
    }

    #[tokio::test]
    async fn test_create_table_bad_identifier_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = file_session(&dir);
        let path = write_definition(
            &dir,
            r#"{"table_name": "orders; DROP", "columns": [{"name": "id", "type": "INT"}]}"#,
        );

        let outcome = create(&session, &TenantId::from(7u64), &path, false)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected);

        let events = session.audit.query(AuditFilter::default()).await.unwrap();
        assert_eq!(events[0].rejection, Some(RejectionKind::InvalidIdentifier));
    }

    #[tokio::test]
    async fn test_create_table_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = file_session(&dir);
        let path = write_definition(&dir, "{not json");

        assert!(
            create(&session, &TenantId::from(7u64), &path, false)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_drop_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = file_session(&dir);
        let tenant = TenantId::from(7u64);

        assert_eq!(
            drop(&session, &tenant, "orders", false).await.unwrap(),
            Outcome::Accepted
        );
        assert_eq!(
            preview(&session, &tenant, "orders", true).await.unwrap(),
            Outcome::Accepted
        );
        assert_eq!(
            drop(&session, &tenant, "user_9.orders", false).await.unwrap(),
            Outcome::Rejected
        );

        let events = session
            .audit
            .query(AuditFilter {
                event_type: Some(AuditEventType::StatementRejected),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rejection, Some(RejectionKind::InvalidIdentifier));

        let accepted = session
            .audit
            .query(AuditFilter {
                event_type: Some(AuditEventType::StatementRewritten),
                ..Default::default()
            })
            .await
            .unwrap();
        let kinds: Vec<_> = accepted.iter().map(|e| e.statement_kind).collect();
        assert_eq!(
            kinds,
            vec![Some(StatementKind::DropTable), Some(StatementKind::Select)]
        );
        assert!(accepted.iter().all(|e| e.tenant_id == "7"));
    }

    #[tokio::test]
    async fn test_generated_requests_not_audited_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TenantSqlConfig::default();
        config.audit.storage = StorageBackend::File;
        config.audit.file_path = Some(dir.path().join("audit.log"));
        let session = Session::from_config(&config).unwrap();
        let tenant = TenantId::from(7u64);
        drop(&session, &tenant, "orders", false).await.unwrap();
        assert!(
            session
                .audit
                .query(AuditFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
