//! The rewrite facade.

use serde::{Deserialize, Serialize};
use tenantsql_core::{
    ConfigError, NamespaceName, NamespacePrefix, RewriteConfig, SqlDialect, TenantId,
    TenantSqlConfig,
};

use crate::binder::{BoundReference, NamespaceBinder};
use crate::collector::ReferenceCollector;
use crate::error::RewriteError;
use crate::parser::{StatementKind, StatementParser};
use crate::reconstruct::Reconstructor;

/// Engine settings, resolved from configuration.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub prefix: NamespacePrefix,
    pub dialect: SqlDialect,
    pub max_depth: usize,
    pub max_identifier_length: usize,
    pub preview_row_limit: u64,
    pub max_statement_bytes: usize,
    pub max_operators: usize,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self::from_rewrite_config(NamespacePrefix::default(), &RewriteConfig::default())
    }
}

impl RewriteOptions {
    pub fn from_config(config: &TenantSqlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_rewrite_config(
            config.namespace_prefix()?,
            &config.rewrite,
        ))
    }

    fn from_rewrite_config(prefix: NamespacePrefix, rewrite: &RewriteConfig) -> Self {
        Self {
            prefix,
            dialect: rewrite.dialect,
            max_depth: rewrite.max_depth,
            max_identifier_length: rewrite.max_identifier_length,
            preview_row_limit: rewrite.preview_row_limit,
            max_statement_bytes: rewrite.max_statement_bytes,
            max_operators: rewrite.max_operators,
        }
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// A parser bounded by these options.
    pub fn statement_parser(&self) -> StatementParser {
        StatementParser::for_max_depth(self.dialect, self.max_depth)
            .with_size_limits(self.max_statement_bytes, self.max_operators)
    }
}

/// A statement confined to one tenant's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewrittenStatement {
    pub sql: String,
    pub kind: StatementKind,
    pub references: Vec<BoundReference>,
}

/// Statement text plus positional parameters, ready for the executor.
///
/// Parameters are passed through exactly as supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub sql: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl ExecutionRequest {
    pub fn new(sql: impl Into<String>, params: Vec<serde_json::Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Confines SQL statements to the namespace of the requesting tenant.
///
/// Holds configuration only; every call builds and discards its own
/// syntax tree, so one rewriter can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct TenantRewriter {
    options: RewriteOptions,
}

impl TenantRewriter {
    pub fn new(options: RewriteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    pub fn dialect(&self) -> SqlDialect {
        self.options.dialect
    }

    /// The namespace a tenant's tables live in.
    pub fn namespace_for(&self, tenant: &TenantId) -> Result<NamespaceName, RewriteError> {
        self.options
            .prefix
            .namespace_for(tenant)
            .map_err(|e| RewriteError::InvalidIdentifier(e.to_string()))
    }

    /// Rewrite one statement for `tenant`.
    ///
    /// Returns the first rejection encountered; nothing is partially
    /// rewritten.
    pub fn rewrite(
        &self,
        sql: &str,
        tenant: &TenantId,
    ) -> Result<RewrittenStatement, RewriteError> {
        let result = self
            .namespace_for(tenant)
            .and_then(|namespace| self.rewrite_in(sql, &namespace));

        // Statement text is never logged, only its kind.
        match &result {
            Ok(rewritten) => tracing::debug!(
                tenant = %tenant,
                kind = %rewritten.kind,
                tables = rewritten.references.len(),
                "statement rewritten"
            ),
            Err(err) if err.kind().is_security_event() => {
                tracing::warn!(tenant = %tenant, rejection = %err.kind(), "statement rejected")
            }
            Err(err) => {
                tracing::debug!(tenant = %tenant, rejection = %err.kind(), "statement rejected")
            }
        }
        result
    }

    /// Rewrite `sql` and bundle it with its positional parameters.
    pub fn prepare(
        &self,
        sql: &str,
        params: Vec<serde_json::Value>,
        tenant: &TenantId,
    ) -> Result<ExecutionRequest, RewriteError> {
        let rewritten = self.rewrite(sql, tenant)?;
        Ok(ExecutionRequest::new(rewritten.sql, params))
    }

    fn rewrite_in(
        &self,
        sql: &str,
        namespace: &NamespaceName,
    ) -> Result<RewrittenStatement, RewriteError> {
        let parsed = self.options.statement_parser().parse(sql)?;
        let collected = ReferenceCollector::new(self.options.max_depth).collect(&parsed)?;
        let references = NamespaceBinder::new(
            namespace,
            self.options.dialect,
            self.options.max_identifier_length,
        )
        .bind(&collected)?;
        let sql = Reconstructor::new(self.options.dialect).reconstruct(parsed.statement, &references)?;

        Ok(RewrittenStatement {
            sql,
            kind: parsed.kind,
            references,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::TableRole;
    use pretty_assertions::assert_eq;

    fn rewriter() -> TenantRewriter {
        TenantRewriter::default()
    }

    fn tenant(id: u64) -> TenantId {
        TenantId::from(id)
    }

    #[test]
    fn test_rewrites_select() {
        let out = rewriter().rewrite("SELECT * FROM orders", &tenant(7)).unwrap();
        assert_eq!(out.sql, "SELECT * FROM \"user_7\".\"orders\"");
        assert_eq!(out.kind, StatementKind::Select);
        assert_eq!(out.references[0].role, TableRole::Read);
    }

    #[test]
    fn test_rewrites_join_with_aliases() {
        let out = rewriter()
            .rewrite(
                "SELECT o.id, c.name FROM orders AS o JOIN customers AS c ON o.cid = c.id",
                &tenant(7),
            )
            .unwrap();
        assert_eq!(
            out.sql,
            "SELECT o.id, c.name FROM \"user_7\".\"orders\" AS o JOIN \"user_7\".\"customers\" AS c ON o.cid = c.id"
        );
    }

    #[test]
    fn test_prepare_passes_params_through() {
        let params = vec![serde_json::json!(42), serde_json::json!("x'); DROP TABLE t; --")];
        let request = rewriter()
            .prepare("SELECT * FROM orders WHERE id = $1 AND note = $2", params.clone(), &tenant(3))
            .unwrap();
        assert_eq!(
            request.sql,
            "SELECT * FROM \"user_3\".\"orders\" WHERE id = $1 AND note = $2"
        );
        assert_eq!(request.params, params);
    }

    #[test]
    fn test_escape_is_rejected() {
        let result = rewriter().rewrite("SELECT * FROM user_8.orders", &tenant(7));
        assert_eq!(result, Err(RewriteError::NamespaceEscape));
    }

    #[test]
    fn test_options_from_config() {
        let config = TenantSqlConfig::from_yaml(
            "namespace:\n  prefix: tenant_\nrewrite:\n  dialect: mysql\n  max_depth: 4\n",
        )
        .unwrap();
        let options = RewriteOptions::from_config(&config).unwrap();
        assert_eq!(options.dialect, SqlDialect::MySql);
        assert_eq!(options.max_depth, 4);

        let out = TenantRewriter::new(options)
            .rewrite("SELECT * FROM orders", &tenant(5))
            .unwrap();
        assert_eq!(out.sql, "SELECT * FROM `tenant_5`.`orders`");
    }

    #[test]
    fn test_rewriter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TenantRewriter>();
    }
}
