//! Audit event types.
//!
//! Events carry the tenant, the statement kind and the rejection kind.
//! Statement text and the names inside it are never recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantsql_rewrite::{RejectionKind, StatementKind};
use uuid::Uuid;

/// Type of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A statement was confined and handed on for execution.
    StatementRewritten,
    /// A statement was refused.
    StatementRejected,
    /// A statement named a namespace other than the tenant's own.
    NamespaceEscapeAttempt,
}

impl AuditEventType {
    /// Event type for a rejection of the given kind.
    pub fn for_rejection(kind: RejectionKind) -> Self {
        match kind {
            RejectionKind::NamespaceEscape => Self::NamespaceEscapeAttempt,
            _ => Self::StatementRejected,
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatementRewritten => write!(f, "STATEMENT_REWRITTEN"),
            Self::StatementRejected => write!(f, "STATEMENT_REJECTED"),
            Self::NamespaceEscapeAttempt => write!(f, "NAMESPACE_ESCAPE_ATTEMPT"),
        }
    }
}

/// An audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Event type.
    pub event_type: AuditEventType,

    /// Tenant that submitted the statement.
    pub tenant_id: String,

    /// Kind of the statement, when it got far enough to be classified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_kind: Option<StatementKind>,

    /// Why the statement was refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectionKind>,

    /// Number of table references bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_count: Option<usize>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, tenant_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_type,
            tenant_id: tenant_id.into(),
            statement_kind: None,
            rejection: None,
            table_count: None,
        }
    }

    pub fn builder(event_type: AuditEventType, tenant_id: impl Into<String>) -> AuditEventBuilder {
        AuditEventBuilder::new(event_type, tenant_id)
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] EVENT_TYPE tenant=... [kind=...] [rejection=...]`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} tenant={}",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event_type,
            self.tenant_id,
        );

        if let Some(kind) = self.statement_kind {
            line.push_str(&format!(" kind=\"{kind}\""));
        }
        if let Some(rejection) = self.rejection {
            line.push_str(&format!(" rejection={rejection}"));
        }
        if let Some(count) = self.table_count {
            line.push_str(&format!(" tables={count}"));
        }

        line
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn new(event_type: AuditEventType, tenant_id: impl Into<String>) -> Self {
        Self {
            event: AuditEvent::new(event_type, tenant_id),
        }
    }

    pub fn statement_kind(mut self, kind: StatementKind) -> Self {
        self.event.statement_kind = Some(kind);
        self
    }

    pub fn rejection(mut self, kind: RejectionKind) -> Self {
        self.event.rejection = Some(kind);
        self
    }

    pub fn table_count(mut self, count: usize) -> Self {
        self.event.table_count = Some(count);
        self
    }

    pub fn build(self) -> AuditEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AuditEvent::builder(AuditEventType::StatementRewritten, "7")
            .statement_kind(StatementKind::Select)
            .table_count(2)
            .build();

        assert_eq!(event.event_type, AuditEventType::StatementRewritten);
        assert_eq!(event.tenant_id, "7");
        assert_eq!(event.statement_kind, Some(StatementKind::Select));
        assert_eq!(event.table_count, Some(2));
        assert!(event.rejection.is_none());
    }

    #[test]
    fn test_to_log_line() {
        let event = AuditEvent::builder(AuditEventType::NamespaceEscapeAttempt, "7")
            .rejection(RejectionKind::NamespaceEscape)
            .build();

        let line = event.to_log_line();
        assert!(line.contains("NAMESPACE_ESCAPE_ATTEMPT"));
        assert!(line.contains("tenant=7"));
        assert!(line.contains("rejection=namespace_escape"));
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let event = AuditEvent::new(AuditEventType::StatementRejected, "7");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "statement_rejected");
        assert!(json.get("rejection").is_none());

        let back: AuditEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_type_for_rejection() {
        assert_eq!(
            AuditEventType::for_rejection(RejectionKind::NamespaceEscape),
            AuditEventType::NamespaceEscapeAttempt
        );
        assert_eq!(
            AuditEventType::for_rejection(RejectionKind::ParseError),
            AuditEventType::StatementRejected
        );
    }
}
