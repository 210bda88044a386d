//! # tenantsql-audit
//!
//! Audit logging of rewrite outcomes.
//!
//! Events record who submitted a statement and what happened to it, never
//! the statement itself:
//!
//! - tenant identity
//! - statement kind, when known
//! - rejection kind, for refused statements
//!
//! ## Event Types
//!
//! | Event Type | Description |
//! |------------|-------------|
//! | `StatementRewritten` | Statement confined and passed on (only with `log_rewrites`) |
//! | `StatementRejected` | Statement refused by the engine or the database |
//! | `NamespaceEscapeAttempt` | Statement named another namespace |
//!
//! ## Storage
//!
//! - **Console**: human-readable lines on stdout
//! - **File**: JSON Lines, queryable
//! - **Null**: discards events
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tenantsql_audit::AuditLogger;
//! use tenantsql_core::{AuditConfig, TenantId};
//! use tenantsql_rewrite::TenantRewriter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = AuditLogger::new(AuditConfig::default())?;
//! let tenant = TenantId::from(7u64);
//!
//! let outcome = TenantRewriter::default().rewrite("SELECT * FROM user_9.orders", &tenant);
//! logger.log_outcome(&tenant, &outcome).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod logger;
pub mod storage;

pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder, AuditEventType};
pub use logger::{AuditFilter, AuditLogger};
pub use storage::{AuditStorage, ConsoleStorage, FileStorage, NullStorage, create_storage};
