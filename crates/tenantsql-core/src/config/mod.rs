//! Configuration types for tenantsql.
//!
//! A single YAML file (conventionally `tenantsql.yaml`) configures the
//! namespace prefix, the rewrite engine, audit logging and log verbosity.
//! Every section is optional; missing keys fall back to defaults.
//!
//! ```yaml
//! namespace:
//!   prefix: user_
//! rewrite:
//!   dialect: postgres
//!   max_depth: 16
//! audit:
//!   enabled: true
//!   storage: file
//!   file_path: /var/log/tenantsql/audit.log
//! logging:
//!   level: info
//! ```
//!
//! The identifier safety rules are not configurable; only the identifier
//! length bound can be tightened.

pub mod audit;
pub mod rewrite;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::tenant::{NamespaceName, NamespacePrefix, TenantError, TenantId};

pub use audit::{AuditConfig, StorageBackend};
pub use rewrite::{NamespaceConfig, RewriteConfig, SqlDialect};

/// Complete tenantsql configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantSqlConfig {
    /// Namespace derivation settings.
    #[serde(default)]
    pub namespace: NamespaceConfig,

    /// Rewrite engine settings.
    #[serde(default)]
    pub rewrite: RewriteConfig,

    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Process log settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log verbosity for the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Tenant(#[from] TenantError),
}

impl TenantSqlConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content and validate it.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.namespace_prefix()?;
        self.rewrite.validate()?;
        if self.audit.enabled
            && self.audit.storage == StorageBackend::File
            && self.audit.file_path.is_none()
        {
            return Err(ConfigError::Config(
                "audit.file_path is required when audit.storage is 'file'".to_string(),
            ));
        }
        Ok(())
    }

    /// The validated namespace prefix.
    pub fn namespace_prefix(&self) -> Result<NamespacePrefix, ConfigError> {
        Ok(NamespacePrefix::new(self.namespace.prefix.clone())?)
    }

    /// Derive the namespace for a tenant under this configuration.
    pub fn namespace_for(&self, tenant: &TenantId) -> Result<NamespaceName, ConfigError> {
        Ok(self.namespace_prefix()?.namespace_for(tenant)?)
    }
}
