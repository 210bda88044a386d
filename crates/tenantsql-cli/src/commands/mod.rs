//! CLI command implementations for tenantsql.

pub mod catalog;
pub mod check;
pub mod rewrite;
pub mod table;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tenantsql_audit::AuditLogger;
use tenantsql_core::{TenantId, TenantSqlConfig};
use tenantsql_rewrite::{
    ExecutionRequest, Rejection, RewriteError, RewriteOptions, StatementKind, TenantRewriter,
};

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    /// The engine refused the input. The process exits non-zero.
    Rejected,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Accepted => ExitCode::SUCCESS,
            Outcome::Rejected => ExitCode::FAILURE,
        }
    }
}

/// Load configuration from `path`, or defaults when no path was given.
pub fn load_config(path: Option<&Path>) -> Result<TenantSqlConfig> {
    match path {
        Some(path) => TenantSqlConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(TenantSqlConfig::default()),
    }
}

/// The rewriter and audit logger shared by every command.
pub struct Session {
    pub rewriter: TenantRewriter,
    pub audit: AuditLogger,
}

impl Session {
    pub fn from_config(config: &TenantSqlConfig) -> Result<Self> {
        let options = RewriteOptions::from_config(config).context("Invalid rewrite configuration")?;
        let audit =
            AuditLogger::new(config.audit.clone()).context("Failed to initialize audit logger")?;
        tracing::debug!(
            dialect = %options.dialect,
            prefix = options.prefix.as_str(),
            audit = audit.is_enabled(),
            "session ready"
        );
        Ok(Self {
            rewriter: TenantRewriter::new(options),
            audit,
        })
    }

    /// Audit and report an engine-generated request of the given kind.
    pub async fn emit_request(
        &self,
        tenant: &TenantId,
        kind: StatementKind,
        request: Result<ExecutionRequest, RewriteError>,
        json: bool,
    ) -> Result<Outcome> {
        match request {
            Ok(request) => {
                self.audit
                    .log_generated(tenant, kind)
                    .await
                    .context("Failed to record audit event")?;
                println!("{}", render_request(&request, json)?);
                Ok(Outcome::Accepted)
            }
            Err(err) => {
                self.audit
                    .log_rejection(tenant, err.kind())
                    .await
                    .context("Failed to record audit event")?;
                report_rejection(&err.to_rejection(), json)?;
                Ok(Outcome::Rejected)
            }
        }
    }
}

/// Statement text, followed by its parameters when there are any.
pub fn render_request(request: &ExecutionRequest, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(request)?);
    }
    if request.params.is_empty() {
        Ok(request.sql.clone())
    } else {
        Ok(format!(
            "{}\n-- params: {}",
            request.sql,
            serde_json::to_string(&request.params)?
        ))
    }
}

/// Print a rejection by its stable kind.
pub fn report_rejection(rejection: &Rejection, json: bool) -> Result<()> {
    if json {
        let payload = serde_json::json!({ "rejection": rejection });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        eprintln!("rejected: {} ({})", rejection.kind, rejection.message);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::path::PathBuf;
    use tenantsql_core::StorageBackend;

    /// A session that audits every outcome into `<dir>/audit.log`.
    pub fn file_session(dir: &tempfile::TempDir) -> (Session, PathBuf) {
        let path = dir.path().join("audit.log");
        let mut config = TenantSqlConfig::default();
        config.audit.log_rewrites = true;
        config.audit.storage = StorageBackend::File;
        config.audit.file_path = Some(path.clone());
        (Session::from_config(&config).unwrap(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.namespace.prefix, "user_");
    }

    #[test]
    fn test_load_config_reports_path() {
        let err = load_config(Some(Path::new("/nonexistent/tenantsql.yaml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tenantsql.yaml"));
    }

    #[test]
    fn test_render_request() {
        let plain = ExecutionRequest::new("SELECT 1", vec![]);
        assert_eq!(render_request(&plain, false).unwrap(), "SELECT 1");

        let with_params = ExecutionRequest::new("SELECT $1", vec![json!("user_7")]);
        assert_eq!(
            render_request(&with_params, false).unwrap(),
            "SELECT $1\n-- params: [\"user_7\"]"
        );

        let rendered: serde_json::Value =
            serde_json::from_str(&render_request(&with_params, true).unwrap()).unwrap();
        assert_eq!(rendered["params"][0], "user_7");
    }
}
