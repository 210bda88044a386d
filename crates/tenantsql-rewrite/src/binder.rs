//! Namespace binding.
//!
//! Resolves every collected table reference against the tenant's namespace.
//! Unqualified names are placed inside it, names qualified with the
//! namespace itself are accepted, and anything else is an escape.

use serde::Serialize;
use sqlparser::ast::{Ident, ObjectName};
use tenantsql_core::{NamespaceName, SqlDialect};

use crate::collector::{CollectedStatement, QualifierUse, TableReference, TableRole};
use crate::dialect::qualified_name;
use crate::error::RewriteError;
use crate::identifier::validate_identifier;

/// A table reference resolved into the tenant namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundReference {
    pub role: TableRole,
    pub namespace: String,
    pub table: String,
    pub alias: Option<String>,
}

impl BoundReference {
    /// `"namespace"."table"` in the dialect's quoting.
    pub fn qualified_name(&self, dialect: SqlDialect) -> String {
        qualified_name(dialect, &self.namespace, &self.table)
    }
}

/// Binds references for one tenant namespace.
#[derive(Debug, Clone)]
pub struct NamespaceBinder<'a> {
    namespace: &'a NamespaceName,
    dialect: SqlDialect,
    max_identifier_length: usize,
}

impl<'a> NamespaceBinder<'a> {
    pub fn new(namespace: &'a NamespaceName, dialect: SqlDialect, max_identifier_length: usize) -> Self {
        Self {
            namespace,
            dialect,
            max_identifier_length,
        }
    }

    /// Bind every collected reference, in order.
    ///
    /// Escapes anywhere in the statement are reported before identifier
    /// problems, so an escape attempt is never downgraded to a formatting
    /// error.
    pub fn bind(&self, collected: &CollectedStatement) -> Result<Vec<BoundReference>, RewriteError> {
        let mut tables = Vec::with_capacity(collected.tables.len());
        for reference in &collected.tables {
            tables.push(self.split(&reference.name)?);
        }
        for qualifier in &collected.qualifiers {
            self.check_qualifier(qualifier)?;
        }

        let mut bound = Vec::with_capacity(tables.len());
        for (reference, ident) in collected.tables.iter().zip(tables) {
            bound.push(self.bind_table(reference, ident)?);
        }
        for ident in &collected.identifiers {
            validate_identifier(&ident.value, self.max_identifier_length)?;
        }
        Ok(bound)
    }

    /// Resolve a table name as the database would.
    ///
    /// Qualifiers are never resolved this way: they must spell the
    /// namespace exactly.
    fn resolve(&self, ident: &Ident) -> String {
        match ident.quote_style {
            Some(_) => ident.value.clone(),
            None => self.dialect.fold_unquoted(&ident.value),
        }
    }

    /// Split a name into its table part, checking any namespace qualifier.
    fn split<'n>(&self, name: &'n ObjectName) -> Result<&'n Ident, RewriteError> {
        let mut idents = Vec::with_capacity(name.0.len());
        for part in &name.0 {
            match part.as_ident() {
                Some(ident) => idents.push(ident),
                None => {
                    return Err(RewriteError::UnsupportedStatement(
                        "computed table names are not supported".to_string(),
                    ));
                }
            }
        }
        match idents.as_slice() {
            [table] => Ok(*table),
            [qualifier, table] => {
                if self.namespace.matches(&qualifier.value) {
                    Ok(*table)
                } else {
                    Err(RewriteError::NamespaceEscape)
                }
            }
            [] => Err(RewriteError::Parse("empty table name".to_string())),
            _ => Err(RewriteError::NamespaceEscape),
        }
    }

    fn check_qualifier(&self, qualifier: &QualifierUse) -> Result<(), RewriteError> {
        match qualifier {
            QualifierUse::Namespace(ident) if self.namespace.matches(&ident.value) => Ok(()),
            _ => Err(RewriteError::NamespaceEscape),
        }
    }

    fn bind_table(
        &self,
        reference: &TableReference,
        ident: &Ident,
    ) -> Result<BoundReference, RewriteError> {
        validate_identifier(&ident.value, self.max_identifier_length)?;
        Ok(BoundReference {
            role: reference.role,
            namespace: self.namespace.as_str().to_string(),
            table: self.resolve(ident),
            alias: reference.alias.clone(),
        })
    }
}
