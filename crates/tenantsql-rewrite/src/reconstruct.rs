//! Statement reconstruction.
//!
//! Writes bound names back into the syntax tree and renders it. Relations
//! are replaced by position: the n-th relation the collector saw receives
//! the n-th bound reference.

use std::ops::ControlFlow;

use sqlparser::ast::{ObjectName, ObjectNamePart, Statement, VisitMut, VisitorMut};
use tenantsql_core::SqlDialect;

use crate::binder::BoundReference;
use crate::dialect::quoted_ident;
use crate::error::RewriteError;

#[derive(Debug, Clone, Copy)]
pub struct Reconstructor {
    dialect: SqlDialect,
}

impl Reconstructor {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// Replace every table name in `statement` with its bound form.
    pub fn apply(
        &self,
        statement: &mut Statement,
        bound: &[BoundReference],
    ) -> Result<(), RewriteError> {
        if let Statement::Drop { names, .. } = statement {
            if names.len() != bound.len() {
                return Err(reference_mismatch());
            }
            for (name, reference) in names.iter_mut().zip(bound) {
                *name = self.bound_name(reference);
            }
            return Ok(());
        }

        let mut visitor = ReplaceVisitor {
            reconstructor: self,
            bound,
            next: 0,
        };
        if let ControlFlow::Break(err) = statement.visit(&mut visitor) {
            return Err(err);
        }
        if visitor.next != bound.len() {
            return Err(reference_mismatch());
        }
        Ok(())
    }

    /// Apply and render in one step.
    pub fn reconstruct(
        &self,
        mut statement: Statement,
        bound: &[BoundReference],
    ) -> Result<String, RewriteError> {
        self.apply(&mut statement, bound)?;
        Ok(statement.to_string())
    }

    fn bound_name(&self, reference: &BoundReference) -> ObjectName {
        ObjectName(vec![
            ObjectNamePart::Identifier(quoted_ident(self.dialect, &reference.namespace)),
            ObjectNamePart::Identifier(quoted_ident(self.dialect, &reference.table)),
        ])
    }
}

fn reference_mismatch() -> RewriteError {
    RewriteError::UnsupportedStatement("table references could not be rebound".to_string())
}

struct ReplaceVisitor<'a> {
    reconstructor: &'a Reconstructor,
    bound: &'a [BoundReference],
    next: usize,
}

impl VisitorMut for ReplaceVisitor<'_> {
    type Break = RewriteError;

    fn pre_visit_relation(&mut self, relation: &mut ObjectName) -> ControlFlow<Self::Break> {
        let Some(reference) = self.bound.get(self.next) else {
            return ControlFlow::Break(reference_mismatch());
        };
        *relation = self.reconstructor.bound_name(reference);
        self.next += 1;
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::TableRole;
    use crate::parser::StatementParser;
    use pretty_assertions::assert_eq;

    fn bound(tables: &[&str]) -> Vec<BoundReference> {
        tables
            .iter()
            .map(|t| BoundReference {
                role: TableRole::Read,
                namespace: "user_7".to_string(),
                table: t.to_string(),
                alias: None,
            })
            .collect()
    }

    fn reconstruct(sql: &str, tables: &[&str]) -> Result<String, RewriteError> {
        let parsed = StatementParser::default().parse(sql).unwrap();
        Reconstructor::new(SqlDialect::Postgres).reconstruct(parsed.statement, &bound(tables))
    }

    #[test]
    fn test_replaces_in_order() {
        assert_eq!(
            reconstruct("SELECT * FROM a JOIN b ON a.id = b.id", &["a", "b"]).unwrap(),
            "SELECT * FROM \"user_7\".\"a\" JOIN \"user_7\".\"b\" ON a.id = b.id"
        );
    }

    #[test]
    fn test_replaces_drop_names() {
        assert_eq!(
            reconstruct("DROP TABLE a, b", &["a", "b"]).unwrap(),
            "DROP TABLE \"user_7\".\"a\", \"user_7\".\"b\""
        );
    }

    #[test]
    fn test_mismatched_counts_are_rejected() {
        assert!(matches!(
            reconstruct("SELECT * FROM a JOIN b ON true", &["a"]),
            Err(RewriteError::UnsupportedStatement(_))
        ));
        assert!(matches!(
            reconstruct("SELECT * FROM a", &["a", "b"]),
            Err(RewriteError::UnsupportedStatement(_))
        ));
    }

    #[test]
    fn test_mysql_quoting() {
        let parsed = StatementParser::new(SqlDialect::MySql)
            .parse("SELECT * FROM orders")
            .unwrap();
        let sql = Reconstructor::new(SqlDialect::MySql)
            .reconstruct(parsed.statement, &bound(&["orders"]))
            .unwrap();
        assert_eq!(sql, "SELECT * FROM `user_7`.`orders`");
    }
}
