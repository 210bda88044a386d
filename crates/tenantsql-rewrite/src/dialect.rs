//! Dialect plumbing: sqlparser dialect selection and identifier quoting.

use sqlparser::ast::Ident;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect};
use tenantsql_core::SqlDialect;

/// The sqlparser dialect for a configured target dialect.
pub fn parser_dialect(dialect: SqlDialect) -> Box<dyn Dialect> {
    match dialect {
        SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
        SqlDialect::Generic => Box::new(GenericDialect {}),
        SqlDialect::MySql => Box::new(MySqlDialect {}),
    }
}

/// A quoted identifier node in the dialect's quoting style.
pub fn quoted_ident(dialect: SqlDialect, value: &str) -> Ident {
    Ident::with_quote(dialect.quote_char(), value)
}

/// Render an identifier quoted for the dialect.
///
/// This is the only way engine-generated SQL emits a name; embedded quote
/// characters are doubled by the renderer.
pub fn quote_identifier(dialect: SqlDialect, value: &str) -> String {
    quoted_ident(dialect, value).to_string()
}

/// Render `namespace.table`, both parts quoted.
pub fn qualified_name(dialect: SqlDialect, namespace: &str, table: &str) -> String {
    format!(
        "{}.{}",
        quote_identifier(dialect, namespace),
        quote_identifier(dialect, table)
    )
}

/// Positional placeholder for the n-th (1-based) parameter.
pub fn placeholder(dialect: SqlDialect, position: usize) -> String {
    match dialect {
        SqlDialect::Postgres => format!("${position}"),
        SqlDialect::Generic | SqlDialect::MySql => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier(SqlDialect::Postgres, "orders"), "\"orders\"");
        assert_eq!(quote_identifier(SqlDialect::MySql, "orders"), "`orders`");
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier(SqlDialect::Postgres, "a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(
            qualified_name(SqlDialect::Postgres, "user_7", "orders"),
            "\"user_7\".\"orders\""
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholder(SqlDialect::Postgres, 2), "$2");
        assert_eq!(placeholder(SqlDialect::MySql, 2), "?");
    }
}
