//! Table lifecycle and catalog statements.
//!
//! These statements are generated by the engine from a validated table name
//! rather than rewritten from tenant SQL. Catalog queries read the shared
//! `information_schema`, with the tenant namespace bound as a parameter.

use serde_json::Value;
use tenantsql_core::{SqlDialect, TenantId};

use crate::dialect::{placeholder, qualified_name};
use crate::error::RewriteError;
use crate::identifier::validate_identifier;
use crate::rewriter::{ExecutionRequest, TenantRewriter};

/// Positional parameters for a catalog query.
///
/// Postgres placeholders can repeat (`$1`); `?` placeholders cannot, so the
/// value is pushed again for every use.
struct CatalogParams {
    dialect: SqlDialect,
    values: Vec<Value>,
    positional: Vec<Value>,
}

impl CatalogParams {
    fn new(dialect: SqlDialect, values: Vec<Value>) -> Self {
        Self {
            dialect,
            values,
            positional: Vec::new(),
        }
    }

    /// Placeholder for the value at `index`.
    fn slot(&mut self, index: usize) -> String {
        match self.dialect {
            SqlDialect::Postgres => placeholder(self.dialect, index + 1),
            SqlDialect::Generic | SqlDialect::MySql => {
                self.positional
                    .push(self.values.get(index).cloned().unwrap_or_default());
                placeholder(self.dialect, self.positional.len())
            }
        }
    }

    fn into_params(self) -> Vec<Value> {
        match self.dialect {
            SqlDialect::Postgres => self.values,
            SqlDialect::Generic | SqlDialect::MySql => self.positional,
        }
    }
}

impl TenantRewriter {
    /// `DROP TABLE IF EXISTS` for one of the tenant's tables.
    pub fn drop_table(
        &self,
        table: &str,
        tenant: &TenantId,
    ) -> Result<ExecutionRequest, RewriteError> {
        let name = self.tenant_table(table, tenant)?;
        Ok(ExecutionRequest::new(
            format!("DROP TABLE IF EXISTS {name} CASCADE"),
            Vec::new(),
        ))
    }

    /// First rows of one of the tenant's tables.
    pub fn preview_rows(
        &self,
        table: &str,
        tenant: &TenantId,
    ) -> Result<ExecutionRequest, RewriteError> {
        let name = self.tenant_table(table, tenant)?;
        Ok(ExecutionRequest::new(
            format!(
                "SELECT * FROM {name} LIMIT {}",
                self.options().preview_row_limit
            ),
            Vec::new(),
        ))
    }

    /// Base tables in the tenant's namespace.
    pub fn list_tables(&self, tenant: &TenantId) -> Result<ExecutionRequest, RewriteError> {
        let namespace = self.namespace_for(tenant)?;
        let mut params = CatalogParams::new(
            self.dialect(),
            vec![Value::String(namespace.as_str().to_string())],
        );
        let sql = format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = {} AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            params.slot(0)
        );
        Ok(ExecutionRequest::new(sql, params.into_params()))
    }

    /// Column listing of one of the tenant's tables.
    ///
    /// Yields `column_name, data_type, is_nullable, column_key, is_unique`
    /// where `column_key` is `PRI` for primary key columns and `is_unique`
    /// is `UNI` for columns under a unique constraint.
    pub fn describe_table(
        &self,
        table: &str,
        tenant: &TenantId,
    ) -> Result<ExecutionRequest, RewriteError> {
        validate_identifier(table, self.options().max_identifier_length)?;
        let namespace = self.namespace_for(tenant)?;
        let mut params = CatalogParams::new(
            self.dialect(),
            vec![
                Value::String(namespace.as_str().to_string()),
                Value::String(table.to_string()),
            ],
        );

        let mut key_subquery = |constraint: &str, marker: &str| {
            format!(
                "(SELECT '{marker}' FROM information_schema.table_constraints tc \
                 JOIN information_schema.key_column_usage kcu \
                 ON tc.constraint_name = kcu.constraint_name \
                 AND tc.table_schema = kcu.table_schema \
                 AND tc.table_name = kcu.table_name \
                 WHERE tc.table_schema = {} AND tc.table_name = {} \
                 AND tc.constraint_type = '{constraint}' \
                 AND kcu.column_name = c.column_name \
                 LIMIT 1)",
                params.slot(0),
                params.slot(1)
            )
        };
        let column_key = key_subquery("PRIMARY KEY", "PRI");
        let is_unique = key_subquery("UNIQUE", "UNI");

        let sql = format!(
            "SELECT c.column_name, c.data_type, c.is_nullable, \
             {column_key} AS column_key, {is_unique} AS is_unique \
             FROM information_schema.columns c \
             WHERE c.table_schema = {} AND c.table_name = {} \
             ORDER BY c.ordinal_position",
            params.slot(0),
            params.slot(1)
        );
        Ok(ExecutionRequest::new(sql, params.into_params()))
    }

    fn tenant_table(&self, table: &str, tenant: &TenantId) -> Result<String, RewriteError> {
        validate_identifier(table, self.options().max_identifier_length)?;
        let namespace = self.namespace_for(tenant)?;
        Ok(qualified_name(self.dialect(), namespace.as_str(), table))
    }
}
