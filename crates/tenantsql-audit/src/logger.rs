//! Audit logger implementation.
//!
//! Provides the main `AuditLogger` type with helpers for recording rewrite
//! outcomes.

use std::sync::Arc;

use tenantsql_core::{AuditConfig, TenantId};
use tenantsql_rewrite::{
    ExecutionError, RejectionKind, RewriteError, RewrittenStatement, StatementKind,
};

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventType};
use crate::storage::{AuditStorage, NullStorage, create_storage};

/// The main audit logger.
pub struct AuditLogger {
    config: AuditConfig,
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Create a new audit logger with the given configuration.
    pub fn new(config: AuditConfig) -> Result<Self, AuditError> {
        let storage: Arc<dyn AuditStorage> = Arc::from(create_storage(&config)?);
        Ok(Self { config, storage })
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(config: AuditConfig, storage: Arc<dyn AuditStorage>) -> Self {
        Self { config, storage }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            config: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            storage: Arc::new(NullStorage),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Log an audit event.
    pub async fn log(&self, event: AuditEvent) -> Result<(), AuditError> {
        if !self.config.enabled {
            return Ok(());
        }

        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            tenant = %event.tenant_id,
            "Audit event"
        );

        self.storage.store(event).await
    }

    /// Record the outcome of a rewrite.
    ///
    /// Rejections are always recorded; successful rewrites only when
    /// `log_rewrites` is set.
    pub async fn log_outcome(
        &self,
        tenant: &TenantId,
        outcome: &Result<RewrittenStatement, RewriteError>,
    ) -> Result<(), AuditError> {
        match outcome {
            Ok(rewritten) => {
                if !self.config.log_rewrites {
                    return Ok(());
                }
                let event = AuditEvent::builder(AuditEventType::StatementRewritten, tenant.as_str())
                    .statement_kind(rewritten.kind)
                    .table_count(rewritten.references.len())
                    .build();
                self.log(event).await
            }
            Err(err) => self.log_rejection(tenant, err.kind()).await,
        }
    }

    /// Record a statement the engine generated itself, such as a DROP TABLE
    /// or a catalog query. Only recorded when `log_rewrites` is set.
    pub async fn log_generated(
        &self,
        tenant: &TenantId,
        kind: StatementKind,
    ) -> Result<(), AuditError> {
        if !self.config.log_rewrites {
            return Ok(());
        }
        let event = AuditEvent::builder(AuditEventType::StatementRewritten, tenant.as_str())
            .statement_kind(kind)
            .build();
        self.log(event).await
    }

    /// Record a statement the database refused after rewriting.
    pub async fn log_execution_failure(
        &self,
        tenant: &TenantId,
        rewritten: &RewrittenStatement,
        error: &ExecutionError,
    ) -> Result<(), AuditError> {
        // Driver detail stays in the server log.
        tracing::warn!(tenant = %tenant, detail = error.detail(), "statement execution failed");
        let event = AuditEvent::builder(AuditEventType::StatementRejected, tenant.as_str())
            .statement_kind(rewritten.kind)
            .rejection(RejectionKind::ExecutionError)
            .build();
        self.log(event).await
    }

    pub async fn log_rejection(
        &self,
        tenant: &TenantId,
        kind: RejectionKind,
    ) -> Result<(), AuditError> {
        let event = AuditEvent::builder(AuditEventType::for_rejection(kind), tenant.as_str())
            .rejection(kind)
            .build();
        self.log(event).await
    }

    /// Query stored events.
    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.storage.query(filter).await
    }
}

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by tenant ID.
    pub tenant_id: Option<String>,
    /// Filter by event type.
    pub event_type: Option<AuditEventType>,
    /// Filter by start time.
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(ref tenant) = self.tenant_id {
            if &event.tenant_id != tenant {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if event.occurred_at < start {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use tenantsql_core::StorageBackend;
    use tenantsql_rewrite::TenantRewriter;

    fn file_logger(dir: &tempfile::TempDir, log_rewrites: bool) -> AuditLogger {
        let config = AuditConfig {
            enabled: true,
            log_rewrites,
            storage: StorageBackend::File,
            file_path: Some(dir.path().join("audit.log")),
        };
        AuditLogger::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_disabled_logger() {
        let logger = AuditLogger::disabled();
        assert!(!logger.is_enabled());
        logger
            .log_rejection(&TenantId::from(7u64), RejectionKind::ParseError)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_escape_is_recorded_without_sql() {
        let dir = tempfile::tempdir().unwrap();
        let logger = file_logger(&dir, false);
        let tenant = TenantId::from(7u64);

        let outcome = TenantRewriter::default().rewrite("SELECT * FROM user_9.orders", &tenant);
        logger.log_outcome(&tenant, &outcome).await.unwrap();

        let events = logger.query(AuditFilter::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::NamespaceEscapeAttempt);
        assert_eq!(events[0].tenant_id, "7");

        let raw = std::fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert!(!raw.contains("user_9"));
        assert!(!raw.contains("orders"));
    }

    #[tokio::test]
    async fn test_rewrites_logged_only_when_enabled() {
        let tenant = TenantId::from(7u64);
        let outcome = TenantRewriter::default().rewrite("SELECT * FROM orders", &tenant);

        let dir = tempfile::tempdir().unwrap();
        let quiet = file_logger(&dir, false);
        quiet.log_outcome(&tenant, &outcome).await.unwrap();
        assert!(quiet.query(AuditFilter::default()).await.unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let verbose = file_logger(&dir, true);
        verbose.log_outcome(&tenant, &outcome).await.unwrap();
        let events = verbose.query(AuditFilter::default()).await.unwrap();
        assert_eq!(events[0].event_type, AuditEventType::StatementRewritten);
        assert_eq!(events[0].table_count, Some(1));
    }

    #[tokio::test]
    async fn test_generated_requests_follow_log_rewrites() {
        let tenant = TenantId::from(7u64);

        let dir = tempfile::tempdir().unwrap();
        let quiet = file_logger(&dir, false);
        quiet
            .log_generated(&tenant, StatementKind::DropTable)
            .await
            .unwrap();
        assert!(quiet.query(AuditFilter::default()).await.unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        let verbose = file_logger(&dir, true);
        verbose
            .log_generated(&tenant, StatementKind::DropTable)
            .await
            .unwrap();
        let events = verbose.query(AuditFilter::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::StatementRewritten);
        assert_eq!(events[0].statement_kind, Some(StatementKind::DropTable));
        assert_eq!(events[0].table_count, None);
    }

    #[tokio::test]
    async fn test_execution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path().join("audit.log")));
        let logger = AuditLogger::with_storage(AuditConfig::default(), storage);
        let tenant = TenantId::from(7u64);

        let rewritten = TenantRewriter::default()
            .rewrite("CREATE TABLE orders (id INT)", &tenant)
            .unwrap();
        let error = ExecutionError::new("relation already exists");
        logger
            .log_execution_failure(&tenant, &rewritten, &error)
            .await
            .unwrap();

        let events = logger
            .query(AuditFilter {
                event_type: Some(AuditEventType::StatementRejected),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(events[0].rejection, Some(RejectionKind::ExecutionError));
        assert!(
            !std::fs::read_to_string(dir.path().join("audit.log"))
                .unwrap()
                .contains("already exists")
        );
    }
}
