//! Tenant identities and the namespaces derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest identifier Postgres keeps without truncation.
pub const MAX_NAMESPACE_LENGTH: usize = 63;

/// Longest tenant identity accepted.
pub const MAX_TENANT_ID_LENGTH: usize = 40;

/// Longest namespace prefix accepted.
pub const MAX_PREFIX_LENGTH: usize = 16;

/// Default namespace prefix.
pub const DEFAULT_PREFIX: &str = "user_";

/// Errors raised while building tenant identities or namespaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    #[error("tenant id must not be empty")]
    EmptyTenantId,

    #[error("tenant id is longer than {MAX_TENANT_ID_LENGTH} characters")]
    TenantIdTooLong,

    #[error("tenant id may only contain lowercase letters, digits and underscores")]
    InvalidTenantId,

    #[error("namespace prefix {0:?} is not a valid identifier prefix")]
    InvalidPrefix(String),

    #[error("derived namespace would exceed {MAX_NAMESPACE_LENGTH} characters")]
    NamespaceTooLong,
}

/// A verified tenant identity.
///
/// Integer identities (the common case) convert losslessly through `From<u64>`;
/// string identities are accepted when they stay inside `[a-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Build a tenant identity from its textual form.
    pub fn new(raw: impl Into<String>) -> Result<Self, TenantError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(TenantError::EmptyTenantId);
        }
        if raw.len() > MAX_TENANT_ID_LENGTH {
            return Err(TenantError::TenantIdTooLong);
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(TenantError::InvalidTenantId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for TenantId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for TenantId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

impl FromStr for TenantId {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = TenantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The operator-configured prefix that precedes every tenant namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePrefix(String);

impl NamespacePrefix {
    /// Validate a prefix: an identifier start character followed by
    /// letters, digits or underscores.
    pub fn new(raw: impl Into<String>) -> Result<Self, TenantError> {
        let raw = raw.into();
        let mut bytes = raw.bytes();
        let valid_start = matches!(bytes.next(), Some(b) if b.is_ascii_lowercase() || b == b'_');
        let valid_rest = bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
        if !valid_start || !valid_rest || raw.len() > MAX_PREFIX_LENGTH {
            return Err(TenantError::InvalidPrefix(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the namespace for a tenant.
    ///
    /// The mapping is injective: the prefix is fixed and the tenant identity
    /// is appended verbatim.
    pub fn namespace_for(&self, tenant: &TenantId) -> Result<NamespaceName, TenantError> {
        let name = format!("{}{}", self.0, tenant.as_str());
        if name.len() > MAX_NAMESPACE_LENGTH {
            return Err(TenantError::NamespaceTooLong);
        }
        Ok(NamespaceName(name))
    }
}

impl Default for NamespacePrefix {
    fn default() -> Self {
        Self(DEFAULT_PREFIX.to_string())
    }
}

/// A tenant's namespace. Only obtainable through [`NamespacePrefix::namespace_for`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(String);

impl NamespaceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive comparison against a qualifier found in SQL.
    pub fn matches(&self, qualifier: &str) -> bool {
        self.0 == qualifier
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
