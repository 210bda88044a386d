//! Rewrite engine and namespace configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::tenant::{DEFAULT_PREFIX, MAX_NAMESPACE_LENGTH};

/// Target SQL dialect of the shared database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// PostgreSQL: schemas as namespaces, `"` quoting, lowercase folding.
    #[default]
    Postgres,
    /// ANSI-ish generic dialect with `"` quoting and no folding.
    Generic,
    /// MySQL: databases as namespaces, backtick quoting.
    #[serde(rename = "mysql")]
    MySql,
}

impl SqlDialect {
    /// Character used to quote identifiers in this dialect.
    pub fn quote_char(self) -> char {
        match self {
            SqlDialect::Postgres | SqlDialect::Generic => '"',
            SqlDialect::MySql => '`',
        }
    }

    /// How the database resolves an unquoted identifier.
    pub fn fold_unquoted(self, ident: &str) -> String {
        match self {
            SqlDialect::Postgres => ident.to_ascii_lowercase(),
            SqlDialect::Generic | SqlDialect::MySql => ident.to_string(),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::Postgres => write!(f, "postgres"),
            SqlDialect::Generic => write!(f, "generic"),
            SqlDialect::MySql => write!(f, "mysql"),
        }
    }
}

/// Namespace derivation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Fixed prefix prepended to every tenant id.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

/// Rewrite engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Dialect used to parse and render statements.
    #[serde(default)]
    pub dialect: SqlDialect,

    /// Maximum subquery nesting depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum length of a table or column identifier.
    #[serde(default = "default_max_identifier_length")]
    pub max_identifier_length: usize,

    /// Row cap for table previews.
    #[serde(default = "default_preview_row_limit")]
    pub preview_row_limit: u64,

    /// Longest statement text accepted, in bytes.
    #[serde(default = "default_max_statement_bytes")]
    pub max_statement_bytes: usize,

    /// Most operator tokens accepted in one statement. Bounds how deep a
    /// chain like `1 + 1 + ...` can nest before it is parsed.
    #[serde(default = "default_max_operators")]
    pub max_operators: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            max_depth: default_max_depth(),
            max_identifier_length: default_max_identifier_length(),
            preview_row_limit: default_preview_row_limit(),
            max_statement_bytes: default_max_statement_bytes(),
            max_operators: default_max_operators(),
        }
    }
}

impl RewriteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Config(
                "rewrite.max_depth must be at least 1".to_string(),
            ));
        }
        if self.max_identifier_length == 0 || self.max_identifier_length > MAX_NAMESPACE_LENGTH {
            return Err(ConfigError::Config(format!(
                "rewrite.max_identifier_length must be between 1 and {MAX_NAMESPACE_LENGTH}"
            )));
        }
        if self.preview_row_limit == 0 {
            return Err(ConfigError::Config(
                "rewrite.preview_row_limit must be at least 1".to_string(),
            ));
        }
        if self.max_statement_bytes == 0 {
            return Err(ConfigError::Config(
                "rewrite.max_statement_bytes must be at least 1".to_string(),
            ));
        }
        if self.max_operators == 0 {
            return Err(ConfigError::Config(
                "rewrite.max_operators must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_max_depth() -> usize {
    16
}

fn default_max_identifier_length() -> usize {
    MAX_NAMESPACE_LENGTH
}

fn default_preview_row_limit() -> u64 {
    100
}

fn default_max_statement_bytes() -> usize {
    256 * 1024
}

fn default_max_operators() -> usize {
    1000
}
