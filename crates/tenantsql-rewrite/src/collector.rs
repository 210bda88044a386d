//! Reference collection.
//!
//! Walks a parsed statement with sqlparser's [`Visitor`] and records every
//! table reference in tree order, together with the namespace qualifiers and
//! quoted identifiers the binder has to check. Constructs that name tables
//! the walk cannot see are rejected here.

use std::collections::HashSet;
use std::ops::ControlFlow;

use sqlparser::ast::{
    AlterColumnOperation, AlterTableOperation, ArrayElemTypeDef, AssignmentTarget, DataType, Expr,
    FromTable, Ident, ObjectName, ObjectNamePart, Query, RenameTableNameKind, SelectItem, SetExpr,
    Statement, TableAlias, TableFactor, TableWithJoins, TypedString, Visit, Visitor,
};

use crate::error::RewriteError;
use crate::parser::{ParsedStatement, StatementKind};

/// Functions that reach sequences, settings or other relations by name.
const DENIED_FUNCTIONS: &[&str] = &[
    "currval",
    "current_setting",
    "lastval",
    "nextval",
    "set_config",
    "setval",
];

/// Function families that resolve names or read the server: catalog and
/// admin functions, large objects, `to_regclass` and friends, dblink.
const DENIED_FUNCTION_PREFIXES: &[&str] = &["pg_", "lo_", "to_reg", "dblink", "has_"];

/// `query_to_xml`, `table_to_xml`, `schema_to_xml` and their variants.
const DENIED_FUNCTION_INFIXES: &[&str] = &["_to_xml"];

/// Object identifier types whose input resolves a name in any namespace.
const NAME_RESOLVING_TYPES: &[&str] = &[
    "regclass",
    "regcollation",
    "regconfig",
    "regdictionary",
    "regnamespace",
    "regoper",
    "regoperator",
    "regproc",
    "regprocedure",
    "regrole",
    "regtype",
];

fn is_denied_function(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    DENIED_FUNCTIONS.contains(&name.as_str())
        || DENIED_FUNCTION_PREFIXES.iter().any(|p| name.starts_with(p))
        || DENIED_FUNCTION_INFIXES.iter().any(|i| name.contains(i))
}

fn name_resolving_type() -> RewriteError {
    RewriteError::UnsupportedStatement("object identifier types are not allowed".to_string())
}

/// How a table participates in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    /// Row source of a query.
    Read,
    /// Table written by INSERT, UPDATE or DELETE.
    WriteTarget,
    /// Right-hand side of a JOIN.
    JoinOperand,
    /// Table created, dropped, altered or truncated.
    DdlSubject,
}

/// A table name as written in the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    pub name: ObjectName,
    pub role: TableRole,
    pub alias: Option<String>,
}

/// A namespace position outside table names.
#[derive(Debug, Clone, PartialEq)]
pub enum QualifierUse {
    /// `ns.func(..)` or `ns.table.column`.
    Namespace(Ident),
    /// Catalog-qualified function or column; never inside a tenant.
    Catalog,
}

/// Everything the binder needs from one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedStatement {
    pub kind: StatementKind,
    /// Table references in tree order.
    pub tables: Vec<TableReference>,
    pub qualifiers: Vec<QualifierUse>,
    /// Identifiers that must pass the identifier check: every quoted name,
    /// plus the columns, aliases and new names a statement defines.
    pub identifiers: Vec<Ident>,
}

impl CollectedStatement {
    pub fn has_role(&self, role: TableRole) -> bool {
        self.tables.iter().any(|t| t.role == role)
    }
}

/// Collects table references from parsed statements.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceCollector {
    max_depth: usize,
}

impl ReferenceCollector {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn collect(&self, parsed: &ParsedStatement) -> Result<CollectedStatement, RewriteError> {
        let mut visitor = CollectVisitor {
            kind: parsed.kind,
            max_depth: self.max_depth,
            depth: 0,
            join_operands: HashSet::new(),
            pending: None,
            first_factor_seen: false,
            out: CollectedStatement {
                kind: parsed.kind,
                tables: Vec::new(),
                qualifiers: Vec::new(),
                identifiers: parsed.quoted_identifiers.clone(),
            },
        };

        if let Statement::Drop { names, .. } = &parsed.statement {
            // DROP names are not relation positions for the visitor.
            for name in names {
                visitor.out.tables.push(TableReference {
                    name: name.clone(),
                    role: TableRole::DdlSubject,
                    alias: None,
                });
            }
        } else if let ControlFlow::Break(err) = parsed.statement.visit(&mut visitor) {
            return Err(err);
        }

        let collected = visitor.out;
        check_subject(&collected)?;

        tracing::trace!(
            kind = %collected.kind,
            tables = collected.tables.len(),
            qualifiers = collected.qualifiers.len(),
            "references collected"
        );
        Ok(collected)
    }
}

/// Fail closed when a writing statement has nothing to confine.
fn check_subject(collected: &CollectedStatement) -> Result<(), RewriteError> {
    let required = match collected.kind {
        StatementKind::Select => return Ok(()),
        StatementKind::Insert | StatementKind::Update | StatementKind::Delete => {
            TableRole::WriteTarget
        }
        StatementKind::CreateTable
        | StatementKind::DropTable
        | StatementKind::AlterTable
        | StatementKind::TruncateTable => TableRole::DdlSubject,
    };
    if collected.has_role(required) {
        Ok(())
    } else {
        Err(RewriteError::UnsupportedStatement(format!(
            "no target table found in {}",
            collected.kind
        )))
    }
}

struct CollectVisitor {
    kind: StatementKind,
    max_depth: usize,
    depth: usize,
    /// Table factors that sit on the right-hand side of a join.
    join_operands: HashSet<*const TableFactor>,
    /// Role and alias for the relation the current table factor names.
    pending: Option<(TableRole, Option<String>)>,
    first_factor_seen: bool,
    out: CollectedStatement,
}

impl CollectVisitor {
    fn register_joins(&mut self, from: &[TableWithJoins]) {
        for twj in from {
            self.register_nested(&twj.relation);
            for join in &twj.joins {
                self.join_operands.insert(&join.relation as *const TableFactor);
                self.register_nested(&join.relation);
            }
        }
    }

    fn register_nested(&mut self, factor: &TableFactor) {
        if let TableFactor::NestedJoin {
            table_with_joins, ..
        } = factor
        {
            self.register_joins(std::slice::from_ref(table_with_joins.as_ref()));
        }
    }

    fn check_body(&mut self, body: &SetExpr) -> Result<(), RewriteError> {
        match body {
            SetExpr::Select(select) => {
                if select.into.is_some() {
                    return Err(RewriteError::UnsupportedStatement(
                        "SELECT ... INTO is not supported".to_string(),
                    ));
                }
                self.register_joins(&select.from);
                for item in &select.projection {
                    if let SelectItem::ExprWithAlias { alias, .. } = item {
                        self.out.identifiers.push(alias.clone());
                    }
                }
                Ok(())
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.check_body(left)?;
                self.check_body(right)
            }
            // Nested queries are checked when the visitor reaches them.
            SetExpr::Query(_) | SetExpr::Values(_) => Ok(()),
            _ => Err(RewriteError::UnsupportedStatement(
                "query body is not a SELECT, set operation or VALUES list".to_string(),
            )),
        }
    }

    /// Role of a relation that is not introduced by a table factor.
    fn bare_relation_role(&self) -> TableRole {
        match self.kind {
            StatementKind::Insert => TableRole::WriteTarget,
            kind if kind.is_ddl() => TableRole::DdlSubject,
            _ => TableRole::Read,
        }
    }

    fn record_function_name(&mut self, name: &ObjectName) -> Result<(), RewriteError> {
        match name.0.as_slice() {
            [single] => {
                let Some(ident) = single.as_ident() else {
                    return Err(RewriteError::UnsupportedStatement(
                        "computed function names are not supported".to_string(),
                    ));
                };
                if is_denied_function(&ident.value) {
                    return Err(RewriteError::UnsupportedStatement(format!(
                        "function {} is not allowed",
                        ident.value.to_ascii_lowercase()
                    )));
                }
                self.push_if_quoted(ident);
                Ok(())
            }
            parts => {
                self.record_qualifier(parts);
                Ok(())
            }
        }
    }

    /// `[catalog.]ns.name` outside a table position.
    fn record_qualifier(&mut self, parts: &[ObjectNamePart]) {
        match parts {
            [qualifier, _] => match qualifier.as_ident() {
                Some(ident) => self.out.qualifiers.push(QualifierUse::Namespace(ident.clone())),
                None => self.out.qualifiers.push(QualifierUse::Catalog),
            },
            _ => self.out.qualifiers.push(QualifierUse::Catalog),
        }
    }

    /// Types named by casts and column definitions.
    fn check_data_type(&mut self, data_type: &DataType) -> Result<(), RewriteError> {
        match data_type {
            DataType::Regclass => Err(name_resolving_type()),
            DataType::Custom(name, _) => match name.0.as_slice() {
                [single] => {
                    let Some(ident) = single.as_ident() else {
                        return Err(RewriteError::UnsupportedStatement(
                            "computed type names are not supported".to_string(),
                        ));
                    };
                    if NAME_RESOLVING_TYPES
                        .iter()
                        .any(|t| t.eq_ignore_ascii_case(&ident.value))
                    {
                        return Err(name_resolving_type());
                    }
                    self.push_if_quoted(ident);
                    Ok(())
                }
                parts => {
                    self.record_qualifier(parts);
                    Ok(())
                }
            },
            DataType::Array(
                ArrayElemTypeDef::AngleBracket(inner)
                | ArrayElemTypeDef::SquareBracket(inner, _)
                | ArrayElemTypeDef::Parenthesis(inner),
            ) => self.check_data_type(inner),
            _ => Ok(()),
        }
    }

    fn record_alias(&mut self, alias: &TableAlias) {
        self.out.identifiers.push(alias.name.clone());
        self.out
            .identifiers
            .extend(alias.columns.iter().map(|c| c.name.clone()));
    }

    fn push_if_quoted(&mut self, ident: &Ident) {
        if ident.quote_style.is_some() {
            self.out.identifiers.push(ident.clone());
        }
    }

    /// Names a statement defines or assigns, outside any expression.
    fn record_statement_names(&mut self, statement: &Statement) -> Result<(), RewriteError> {
        match statement {
            Statement::Insert(insert) => {
                self.out.identifiers.extend(insert.columns.iter().cloned());
                self.out.identifiers.extend(insert.table_alias.iter().cloned());
            }
            Statement::Update(update) => {
                for assignment in &update.assignments {
                    let targets = match &assignment.target {
                        AssignmentTarget::ColumnName(name) => std::slice::from_ref(name),
                        AssignmentTarget::Tuple(names) => names.as_slice(),
                    };
                    for target in targets {
                        self.out
                            .identifiers
                            .extend(target.0.iter().filter_map(|p| p.as_ident()).cloned());
                    }
                }
            }
            Statement::CreateTable(create) => {
                for column in &create.columns {
                    self.out.identifiers.push(column.name.clone());
                    self.check_data_type(&column.data_type)?;
                }
            }
            Statement::AlterTable(alter) => {
                for operation in &alter.operations {
                    self.record_alter_names(operation)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn record_alter_names(&mut self, operation: &AlterTableOperation) -> Result<(), RewriteError> {
        match operation {
            AlterTableOperation::AddColumn { column_def, .. } => {
                self.out.identifiers.push(column_def.name.clone());
                self.check_data_type(&column_def.data_type)?;
            }
            AlterTableOperation::RenameColumn {
                new_column_name, ..
            } => self.out.identifiers.push(new_column_name.clone()),
            AlterTableOperation::RenameTable { table_name } => {
                let (RenameTableNameKind::As(name) | RenameTableNameKind::To(name)) = table_name;
                self.out
                    .identifiers
                    .extend(name.0.iter().filter_map(|p| p.as_ident()).cloned());
            }
            AlterTableOperation::ChangeColumn {
                new_name,
                data_type,
                ..
            } => {
                self.out.identifiers.push(new_name.clone());
                self.check_data_type(data_type)?;
            }
            AlterTableOperation::ModifyColumn { data_type, .. } => {
                self.check_data_type(data_type)?;
            }
            AlterTableOperation::RenameConstraint { new_name, .. } => {
                self.out.identifiers.push(new_name.clone());
            }
            AlterTableOperation::AlterColumn {
                op: AlterColumnOperation::SetDataType { data_type, .. },
                ..
            } => self.check_data_type(data_type)?,
            _ => {}
        }
        Ok(())
    }
}

impl Visitor for CollectVisitor {
    type Break = RewriteError;

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        match statement {
            Statement::Update(update) => {
                self.register_joins(std::slice::from_ref(&update.table));
            }
            Statement::Delete(delete) => {
                let (FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables)) =
                    &delete.from;
                self.register_joins(tables);
            }
            _ => {}
        }
        match self.record_statement_names(statement) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => ControlFlow::Break(err),
        }
    }

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return ControlFlow::Break(RewriteError::UnsupportedStatement(format!(
                "subquery nesting exceeds maximum depth of {}",
                self.max_depth
            )));
        }
        if query.with.is_some() {
            return ControlFlow::Break(RewriteError::UnsupportedStatement(
                "WITH clauses are not supported".to_string(),
            ));
        }
        match self.check_body(&query.body) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => ControlFlow::Break(err),
        }
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.depth = self.depth.saturating_sub(1);
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, factor: &TableFactor) -> ControlFlow<Self::Break> {
        match factor {
            TableFactor::Table { alias, args, .. } => {
                if args.is_some() {
                    return ControlFlow::Break(RewriteError::UnsupportedStatement(
                        "table-valued functions are not supported".to_string(),
                    ));
                }
                let writes_first = matches!(self.kind, StatementKind::Update | StatementKind::Delete);
                let role = if writes_first && !self.first_factor_seen {
                    TableRole::WriteTarget
                } else if self.join_operands.contains(&(factor as *const TableFactor)) {
                    TableRole::JoinOperand
                } else {
                    TableRole::Read
                };
                self.first_factor_seen = true;
                if let Some(alias) = alias {
                    self.record_alias(alias);
                }
                self.pending = Some((role, alias.as_ref().map(|a| a.name.value.clone())));
                ControlFlow::Continue(())
            }
            TableFactor::Derived { alias, .. } => {
                if let Some(alias) = alias {
                    self.record_alias(alias);
                }
                ControlFlow::Continue(())
            }
            TableFactor::NestedJoin { .. } => ControlFlow::Continue(()),
            _ => ControlFlow::Break(RewriteError::UnsupportedStatement(
                "only tables and subqueries may appear as row sources".to_string(),
            )),
        }
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        let (role, alias) = self
            .pending
            .take()
            .unwrap_or_else(|| (self.bare_relation_role(), None));
        self.out.tables.push(TableReference {
            name: relation.clone(),
            role,
            alias,
        });
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Identifier(ident) => {
                if ident.quote_style.is_some() {
                    self.out.identifiers.push(ident.clone());
                }
            }
            Expr::CompoundIdentifier(idents) => {
                self.out
                    .identifiers
                    .extend(idents.iter().filter(|i| i.quote_style.is_some()).cloned());
                match idents.len() {
                    0..=2 => {}
                    3 => self
                        .out
                        .qualifiers
                        .push(QualifierUse::Namespace(idents[0].clone())),
                    _ => self.out.qualifiers.push(QualifierUse::Catalog),
                }
            }
            Expr::Function(function) => {
                if let Err(err) = self.record_function_name(&function.name) {
                    return ControlFlow::Break(err);
                }
            }
            Expr::Cast { data_type, .. }
            | Expr::TypedString(TypedString { data_type, .. })
            | Expr::Convert {
                data_type: Some(data_type),
                ..
            } => {
                if let Err(err) = self.check_data_type(data_type) {
                    return ControlFlow::Break(err);
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::StatementParser;

    fn collect(sql: &str) -> Result<CollectedStatement, RewriteError> {
        let parsed = StatementParser::default().parse(sql)?;
        ReferenceCollector::new(16).collect(&parsed)
    }

    fn tables(sql: &str) -> Vec<(String, TableRole)> {
        collect(sql)
            .unwrap()
            .tables
            .into_iter()
            .map(|t| (t.name.to_string(), t.role))
            .collect()
    }

    #[test]
    fn test_select_with_join() {
        assert_eq!(
            tables("SELECT * FROM orders o JOIN customers c ON o.cid = c.id"),
            vec![
                ("orders".to_string(), TableRole::Read),
                ("customers".to_string(), TableRole::JoinOperand),
            ]
        );
    }

    #[test]
    fn test_alias_is_recorded() {
        let collected = collect("SELECT o.id FROM orders AS o").unwrap();
        assert_eq!(collected.tables[0].alias.as_deref(), Some("o"));
    }

    #[test]
    fn test_nested_subqueries() {
        let found = tables(
            "SELECT * FROM orders WHERE cid IN (SELECT id FROM customers \
             WHERE EXISTS (SELECT 1 FROM regions))",
        );
        let names: Vec<_> = found.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["orders", "customers", "regions"]);
    }

    #[test]
    fn test_derived_table_and_union() {
        let found = tables("SELECT * FROM (SELECT * FROM a) x UNION SELECT * FROM b");
        let names: Vec<_> = found.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_write_targets() {
        assert_eq!(
            tables("INSERT INTO orders (id) SELECT id FROM staging"),
            vec![
                ("orders".to_string(), TableRole::WriteTarget),
                ("staging".to_string(), TableRole::Read),
            ]
        );
        assert_eq!(
            tables("UPDATE orders SET a = 1 WHERE id IN (SELECT oid FROM flagged)"),
            vec![
                ("orders".to_string(), TableRole::WriteTarget),
                ("flagged".to_string(), TableRole::Read),
            ]
        );
        assert_eq!(
            tables("DELETE FROM orders WHERE id = 1"),
            vec![("orders".to_string(), TableRole::WriteTarget)]
        );
    }

    #[test]
    fn test_ddl_subjects() {
        assert_eq!(
            tables("DROP TABLE orders, items"),
            vec![
                ("orders".to_string(), TableRole::DdlSubject),
                ("items".to_string(), TableRole::DdlSubject),
            ]
        );
        assert_eq!(
            tables("TRUNCATE TABLE orders"),
            vec![("orders".to_string(), TableRole::DdlSubject)]
        );
        assert_eq!(
            tables("ALTER TABLE orders ADD COLUMN note TEXT"),
            vec![("orders".to_string(), TableRole::DdlSubject)]
        );
    }

    #[test]
    fn test_create_table_columns_are_collected() {
        let collected = collect("CREATE TABLE orders (id INT, \"Total\" NUMERIC)").unwrap();
        assert_eq!(collected.tables[0].role, TableRole::DdlSubject);
        let columns: Vec<_> = collected.identifiers.iter().map(|i| i.value.as_str()).collect();
        // The quoted token first, then each defined column.
        assert_eq!(columns, vec!["Total", "id", "Total"]);
    }

    #[test]
    fn test_string_literals_are_not_references() {
        let collected = collect("SELECT 'user_8.orders' FROM orders").unwrap();
        assert_eq!(collected.tables.len(), 1);
        assert!(collected.qualifiers.is_empty());
    }

    #[test]
    fn test_quoted_columns_are_collected() {
        let collected = collect("SELECT \"a;b\" FROM orders").unwrap();
        assert_eq!(collected.identifiers[0].value, "a;b");
    }

    #[test]
    fn test_qualifiers_from_functions_and_columns() {
        let collected = collect("SELECT pg_catalog.now(), s.t.c FROM orders").unwrap();
        assert!(collected.qualifiers.contains(&QualifierUse::Namespace(Ident::new("pg_catalog"))));
        assert!(collected.qualifiers.contains(&QualifierUse::Namespace(Ident::new("s"))));
    }

    #[test]
    fn test_rejects_cte() {
        let result = collect("WITH x AS (SELECT * FROM user_8.orders) SELECT * FROM x");
        assert!(matches!(result, Err(RewriteError::UnsupportedStatement(_))));
    }

    #[test]
    fn test_rejects_select_into() {
        let result = collect("SELECT * INTO stolen FROM orders");
        assert!(matches!(result, Err(RewriteError::UnsupportedStatement(_))));
    }

    #[test]
    fn test_rejects_table_functions() {
        let result = collect("SELECT * FROM generate_series(1, 10)");
        assert!(matches!(result, Err(RewriteError::UnsupportedStatement(_))));
    }

    #[test]
    fn test_rejects_sql_executing_functions() {
        let result = collect("SELECT query_to_xml('select * from user_8.orders', true, true, '')");
        assert!(matches!(result, Err(RewriteError::UnsupportedStatement(_))));
    }

    #[test]
    fn test_statement_names_are_collected() {
        let names = |sql: &str| -> Vec<String> {
            collect(sql)
                .unwrap()
                .identifiers
                .into_iter()
                .map(|i| i.value)
                .collect()
        };
        assert_eq!(names("INSERT INTO orders (id, total) VALUES (1, 2)"), vec!["id", "total"]);
        assert_eq!(names("UPDATE orders SET total = 0, note = 'x'"), vec!["total", "note"]);
        assert_eq!(names("ALTER TABLE orders RENAME COLUMN note TO memo"), vec!["memo"]);
        assert_eq!(names("ALTER TABLE orders RENAME TO archived"), vec!["archived"]);
        assert_eq!(names("ALTER TABLE orders ADD COLUMN memo TEXT"), vec!["memo"]);
        assert_eq!(names("SELECT id AS n FROM orders AS o"), vec!["n", "o"]);
    }

    #[test]
    fn test_rejects_name_resolving_functions() {
        for sql in [
            "SELECT nextval('user_8.seq')",
            "SELECT setval('user_8.seq', 1)",
            "SELECT currval('user_8.seq')",
            "SELECT pg_relation_size('user_8.orders')",
            "SELECT to_regclass('user_8.orders')",
            "SELECT has_table_privilege('user_8.orders', 'select')",
            "SELECT lo_get(16401)",
            "SELECT \"pg_read_file\"('/etc/passwd')",
            "SELECT * FROM orders WHERE id = nextval('user_8.seq')",
        ] {
            assert!(
                matches!(collect(sql), Err(RewriteError::UnsupportedStatement(_))),
                "{sql}"
            );
        }
        assert!(collect("SELECT count(*), lower(name), now() FROM orders").is_ok());
    }

    #[test]
    fn test_rejects_object_identifier_types() {
        for sql in [
            "SELECT 'user_8.orders'::regclass",
            "SELECT CAST('user_8.f' AS regproc)",
            "SELECT 'user_8'::REGNAMESPACE",
            "CREATE TABLE t (c regclass)",
            "ALTER TABLE orders ADD COLUMN c regtype",
        ] {
            assert!(
                matches!(collect(sql), Err(RewriteError::UnsupportedStatement(_))),
                "{sql}"
            );
        }
    }

    #[test]
    fn test_type_qualifiers_are_collected() {
        let collected = collect("SELECT CAST(1 AS user_9.money_t) FROM orders").unwrap();
        assert_eq!(
            collected.qualifiers,
            vec![QualifierUse::Namespace(Ident::new("user_9"))]
        );

        let collected = collect("CREATE TABLE t (c user_9.money_t)").unwrap();
        assert_eq!(
            collected.qualifiers,
            vec![QualifierUse::Namespace(Ident::new("user_9"))]
        );

        let collected = collect("SELECT CAST(1 AS INTEGER) FROM orders").unwrap();
        assert!(collected.qualifiers.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let mut sql = "SELECT 1 FROM t".to_string();
        for _ in 0..3 {
            sql = format!("SELECT * FROM t WHERE id IN ({sql})");
        }
        let parsed = StatementParser::default().parse(&sql).unwrap();
        assert!(ReferenceCollector::new(4).collect(&parsed).is_ok());
        assert!(matches!(
            ReferenceCollector::new(3).collect(&parsed),
            Err(RewriteError::UnsupportedStatement(_))
        ));
    }
}
