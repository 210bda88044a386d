//! # tenantsql-core
//!
//! Types shared across all tenantsql crates:
//!
//! - [`TenantId`]: the verified tenant identity handed over by the
//!   authentication layer.
//! - [`NamespaceName`]: the reserved namespace (Postgres schema) a tenant's
//!   tables live in, derived from the tenant identity and a fixed prefix.
//! - [`TenantSqlConfig`]: the YAML configuration used by the engine, the audit
//!   logger and the CLI.
//!
//! ## Namespace Derivation
//!
//! ```text
//! prefix "user_" + tenant 7  ->  namespace "user_7"
//! ```
//!
//! The derivation never consumes tenant-authored text: tenant identities are
//! restricted to lowercase ASCII letters, digits and underscores, and the
//! prefix comes from operator configuration.

pub mod config;
pub mod tenant;

pub use config::{
    AuditConfig, ConfigError, LoggingConfig, NamespaceConfig, RewriteConfig, SqlDialect,
    StorageBackend, TenantSqlConfig,
};
pub use tenant::{NamespaceName, NamespacePrefix, TenantError, TenantId};
