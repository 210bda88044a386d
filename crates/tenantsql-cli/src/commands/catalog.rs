//! `tenantsql catalog` command implementation.

use anyhow::Result;
use tenantsql_core::TenantId;
use tenantsql_rewrite::StatementKind;

use super::{Outcome, Session};

/// List the tenant's tables, or describe one of them.
pub async fn run(
    session: &Session,
    tenant: &TenantId,
    table: Option<&str>,
    json: bool,
) -> Result<Outcome> {
    let request = match table {
        Some(table) => session.rewriter.describe_table(table, tenant),
        None => session.rewriter.list_tables(tenant),
    };
    session
        .emit_request(tenant, StatementKind::Select, request, json)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::file_session;
    use tenantsql_audit::{AuditEventType, AuditFilter};

    #[tokio::test]
    async fn test_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = file_session(&dir);
        let tenant = TenantId::from(7u64);

        assert_eq!(
            run(&session, &tenant, None, false).await.unwrap(),
            Outcome::Accepted
        );
        assert_eq!(
            run(&session, &tenant, Some("orders"), true).await.unwrap(),
            Outcome::Accepted
        );
        assert_eq!(
            run(&session, &tenant, Some("orders--"), false).await.unwrap(),
            Outcome::Rejected
        );

        let events = session.audit.query(AuditFilter::default()).await.unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                AuditEventType::StatementRewritten,
                AuditEventType::StatementRewritten,
                AuditEventType::StatementRejected,
            ]
        );
        assert_eq!(events[0].statement_kind, Some(StatementKind::Select));
    }
}
