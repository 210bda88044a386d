//! Error types for the rewrite crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while confining a statement to a tenant namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Input is not a single well-formed statement.
    #[error("failed to parse SQL: {0}")]
    Parse(String),

    /// Statement kind or construct is outside the allow-list.
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// An identifier failed the safety pattern.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// An explicit qualifier points outside the tenant's namespace.
    ///
    /// Carries no payload so the targeted namespace never reaches the caller.
    #[error("statement references a namespace outside the tenant's scope")]
    NamespaceEscape,
}

impl RewriteError {
    /// Stable kind of this rejection.
    pub fn kind(&self) -> RejectionKind {
        match self {
            RewriteError::Parse(_) => RejectionKind::ParseError,
            RewriteError::UnsupportedStatement(_) => RejectionKind::UnsupportedStatement,
            RewriteError::InvalidIdentifier(_) => RejectionKind::InvalidIdentifier,
            RewriteError::NamespaceEscape => RejectionKind::NamespaceEscape,
        }
    }

    /// Structured payload to hand back to the client.
    pub fn to_rejection(&self) -> Rejection {
        Rejection {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Stable enumeration of rejection kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    ParseError,
    UnsupportedStatement,
    InvalidIdentifier,
    NamespaceEscape,
    /// Produced by the execution collaborator, never by the engine.
    ExecutionError,
}

impl RejectionKind {
    /// Kinds the surrounding system should treat as security events.
    pub fn is_security_event(self) -> bool {
        matches!(
            self,
            RejectionKind::NamespaceEscape | RejectionKind::InvalidIdentifier
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RejectionKind::ParseError => "parse_error",
            RejectionKind::UnsupportedStatement => "unsupported_statement",
            RejectionKind::InvalidIdentifier => "invalid_identifier",
            RejectionKind::NamespaceEscape => "namespace_escape",
            RejectionKind::ExecutionError => "execution_error",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection payload returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub message: String,
}

/// The database refused a rewritten statement.
///
/// Constructed by the execution collaborator. The driver message is kept for
/// server-side diagnostics only; clients see the generic rejection.
#[derive(Debug, Clone, Error)]
#[error("statement execution failed")]
pub struct ExecutionError {
    detail: String,
}

impl ExecutionError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// Raw driver message. Not for client responses.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn to_rejection(&self) -> Rejection {
        Rejection {
            kind: RejectionKind::ExecutionError,
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_payload_is_generic() {
        let rejection = RewriteError::NamespaceEscape.to_rejection();
        assert_eq!(rejection.kind, RejectionKind::NamespaceEscape);
        assert!(!rejection.message.contains("user_"));
    }

    #[test]
    fn test_execution_error_hides_driver_detail() {
        let err = ExecutionError::new("relation \"user_7\".\"orders\" already exists");
        let rejection = err.to_rejection();
        assert_eq!(rejection.kind, RejectionKind::ExecutionError);
        assert_eq!(rejection.message, "statement execution failed");
        assert!(err.detail().contains("already exists"));
    }

    #[test]
    fn test_rejection_kind_serialization() {
        let json = serde_json::to_string(&RewriteError::NamespaceEscape.to_rejection()).unwrap();
        assert!(json.contains("\"namespace_escape\""));
        assert!(RejectionKind::NamespaceEscape.is_security_event());
        assert!(!RejectionKind::ParseError.is_security_event());
    }
}
