//! Structured table definitions.
//!
//! The create-table path takes a table name and a column list instead of
//! SQL text. Column types and constraints come from closed sets and every
//! name is validated and quoted, so the only SQL here is what the engine
//! renders itself.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tenantsql_core::TenantId;

use crate::binder::BoundReference;
use crate::collector::TableRole;
use crate::dialect::{qualified_name, quote_identifier};
use crate::error::RewriteError;
use crate::identifier::validate_identifier;
use crate::parser::StatementKind;
use crate::rewriter::{RewrittenStatement, TenantRewriter};

const MAX_VARCHAR_LENGTH: u32 = 10_485_760;
const MAX_NUMERIC_PRECISION: u16 = 1000;

/// A table-definition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    #[serde(alias = "tablename")]
    pub table_name: String,
    #[serde(alias = "cols")]
    pub columns: Vec<ColumnDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(alias = "type")]
    pub column_type: String,
    /// Accepts a list or a single space-separated string.
    #[serde(default, deserialize_with = "one_or_many")]
    pub constraints: Vec<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        None(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.trim().is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::None(()) => Vec::new(),
    })
}

/// Column types accepted on the definition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    SmallInt,
    Integer,
    BigInt,
    Serial,
    BigSerial,
    Real,
    DoublePrecision,
    Numeric {
        precision: Option<u16>,
        scale: Option<u16>,
    },
    Boolean,
    Text,
    Varchar(u32),
    Char(u32),
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Jsonb,
    Bytea,
}

fn unsupported_type() -> RewriteError {
    RewriteError::UnsupportedStatement("unsupported column type".to_string())
}

fn parse_args(args: Option<&str>) -> Result<Vec<u32>, RewriteError> {
    match args {
        None => Ok(Vec::new()),
        Some(args) => args
            .split(',')
            .map(|a| a.parse::<u32>().map_err(|_| unsupported_type()))
            .collect(),
    }
}

impl FromStr for ColumnType {
    type Err = RewriteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        let (name, args) = match compact.split_once('(') {
            Some((name, rest)) => {
                let args = rest.strip_suffix(')').ok_or_else(unsupported_type)?;
                (name, Some(args))
            }
            None => (compact.as_str(), None),
        };
        let args = parse_args(args)?;

        let ty = match (name, args.as_slice()) {
            ("SMALLINT" | "INT2", []) => ColumnType::SmallInt,
            ("INTEGER" | "INT" | "INT4", []) => ColumnType::Integer,
            ("BIGINT" | "INT8", []) => ColumnType::BigInt,
            ("SERIAL", []) => ColumnType::Serial,
            ("BIGSERIAL", []) => ColumnType::BigSerial,
            ("REAL", []) => ColumnType::Real,
            ("DOUBLEPRECISION", []) => ColumnType::DoublePrecision,
            ("NUMERIC" | "DECIMAL", []) => ColumnType::Numeric {
                precision: None,
                scale: None,
            },
            ("NUMERIC" | "DECIMAL", [p]) => ColumnType::Numeric {
                precision: Some(numeric_precision(*p)?),
                scale: None,
            },
            ("NUMERIC" | "DECIMAL", [p, s]) => {
                let precision = numeric_precision(*p)?;
                if *s > u32::from(precision) {
                    return Err(unsupported_type());
                }
                ColumnType::Numeric {
                    precision: Some(precision),
                    scale: Some(*s as u16),
                }
            }
            ("BOOLEAN" | "BOOL", []) => ColumnType::Boolean,
            ("TEXT", []) => ColumnType::Text,
            ("VARCHAR", [n]) => ColumnType::Varchar(char_length(*n)?),
            ("CHAR", [n]) => ColumnType::Char(char_length(*n)?),
            ("DATE", []) => ColumnType::Date,
            ("TIME", []) => ColumnType::Time,
            ("TIMESTAMP", []) => ColumnType::Timestamp,
            ("TIMESTAMPTZ", []) => ColumnType::TimestampTz,
            ("UUID", []) => ColumnType::Uuid,
            ("JSON", []) => ColumnType::Json,
            ("JSONB", []) => ColumnType::Jsonb,
            ("BYTEA", []) => ColumnType::Bytea,
            _ => return Err(unsupported_type()),
        };
        Ok(ty)
    }
}

fn numeric_precision(p: u32) -> Result<u16, RewriteError> {
    if p == 0 || p > u32::from(MAX_NUMERIC_PRECISION) {
        return Err(unsupported_type());
    }
    Ok(p as u16)
}

fn char_length(n: u32) -> Result<u32, RewriteError> {
    if n == 0 || n > MAX_VARCHAR_LENGTH {
        return Err(unsupported_type());
    }
    Ok(n)
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::SmallInt => f.write_str("SMALLINT"),
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::BigInt => f.write_str("BIGINT"),
            ColumnType::Serial => f.write_str("SERIAL"),
            ColumnType::BigSerial => f.write_str("BIGSERIAL"),
            ColumnType::Real => f.write_str("REAL"),
            ColumnType::DoublePrecision => f.write_str("DOUBLE PRECISION"),
            ColumnType::Numeric {
                precision: Some(p),
                scale: Some(s),
            } => write!(f, "NUMERIC({p},{s})"),
            ColumnType::Numeric {
                precision: Some(p),
                scale: None,
            } => write!(f, "NUMERIC({p})"),
            ColumnType::Numeric { .. } => f.write_str("NUMERIC"),
            ColumnType::Boolean => f.write_str("BOOLEAN"),
            ColumnType::Text => f.write_str("TEXT"),
            ColumnType::Varchar(n) => write!(f, "VARCHAR({n})"),
            ColumnType::Char(n) => write!(f, "CHAR({n})"),
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Time => f.write_str("TIME"),
            ColumnType::Timestamp => f.write_str("TIMESTAMP"),
            ColumnType::TimestampTz => f.write_str("TIMESTAMPTZ"),
            ColumnType::Uuid => f.write_str("UUID"),
            ColumnType::Json => f.write_str("JSON"),
            ColumnType::Jsonb => f.write_str("JSONB"),
            ColumnType::Bytea => f.write_str("BYTEA"),
        }
    }
}

/// Column constraints accepted on the definition path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnConstraint {
    PrimaryKey,
    NotNull,
    Null,
    Unique,
    /// Foreign key to a table in the same tenant namespace.
    References { table: String, column: String },
}

fn unsupported_constraint() -> RewriteError {
    RewriteError::UnsupportedStatement("unsupported column constraint".to_string())
}

impl ColumnConstraint {
    /// Parse a space-separated run of constraints, e.g. `NOT NULL UNIQUE`.
    pub fn parse_list(raw: &str) -> Result<Vec<ColumnConstraint>, RewriteError> {
        let spaced = raw.replace('(', " ( ").replace(')', " ) ");
        let mut tokens = spaced.split_whitespace();
        let mut out = Vec::new();

        while let Some(token) = tokens.next() {
            let constraint = match token.to_ascii_uppercase().as_str() {
                "PRIMARY" => match tokens.next() {
                    Some(t) if t.eq_ignore_ascii_case("KEY") => ColumnConstraint::PrimaryKey,
                    _ => return Err(unsupported_constraint()),
                },
                "NOT" => match tokens.next() {
                    Some(t) if t.eq_ignore_ascii_case("NULL") => ColumnConstraint::NotNull,
                    _ => return Err(unsupported_constraint()),
                },
                "NULL" => ColumnConstraint::Null,
                "UNIQUE" => ColumnConstraint::Unique,
                "REFERENCES" => {
                    let table = tokens.next().ok_or_else(unsupported_constraint)?;
                    let (open, column, close) = (tokens.next(), tokens.next(), tokens.next());
                    match (open, column, close) {
                        (Some("("), Some(column), Some(")")) => ColumnConstraint::References {
                            table: table.to_string(),
                            column: column.to_string(),
                        },
                        _ => return Err(unsupported_constraint()),
                    }
                }
                _ => return Err(unsupported_constraint()),
            };
            out.push(constraint);
        }
        Ok(out)
    }
}

/// Table part of a foreign key target. A qualifier must name the tenant's
/// own namespace.
fn foreign_key_target<'t>(table: &'t str, namespace: &str) -> Result<&'t str, RewriteError> {
    let parts: Vec<&str> = table.split('.').collect();
    match parts.as_slice() {
        [table] => Ok(*table),
        [qualifier, table] if *qualifier == namespace => Ok(*table),
        _ => Err(RewriteError::NamespaceEscape),
    }
}

impl TenantRewriter {
    /// Render a CREATE TABLE statement for a structured definition.
    ///
    /// Names keep their case and are always quoted. Foreign keys may only
    /// point at tables in the tenant's own namespace.
    pub fn create_table(
        &self,
        definition: &TableDefinition,
        tenant: &TenantId,
    ) -> Result<RewrittenStatement, RewriteError> {
        let namespace = self.namespace_for(tenant)?;
        let dialect = self.dialect();
        let max_len = self.options().max_identifier_length;

        validate_identifier(&definition.table_name, max_len)?;
        if definition.columns.is_empty() {
            return Err(RewriteError::UnsupportedStatement(
                "a table needs at least one column".to_string(),
            ));
        }

        let mut references = vec![BoundReference {
            role: TableRole::DdlSubject,
            namespace: namespace.as_str().to_string(),
            table: definition.table_name.clone(),
            alias: None,
        }];
        let mut seen = HashSet::new();
        let mut column_sql = Vec::with_capacity(definition.columns.len());

        for column in &definition.columns {
            validate_identifier(&column.name, max_len)?;
            if !seen.insert(column.name.as_str()) {
                return Err(RewriteError::InvalidIdentifier(
                    "duplicate column name".to_string(),
                ));
            }
            let column_type: ColumnType = column.column_type.parse()?;

            let mut rendered = format!("{} {}", quote_identifier(dialect, &column.name), column_type);
            for raw in &column.constraints {
                for constraint in ColumnConstraint::parse_list(raw)? {
                    match constraint {
                        ColumnConstraint::PrimaryKey => rendered.push_str(" PRIMARY KEY"),
                        ColumnConstraint::NotNull => rendered.push_str(" NOT NULL"),
                        ColumnConstraint::Null => rendered.push_str(" NULL"),
                        ColumnConstraint::Unique => rendered.push_str(" UNIQUE"),
                        ColumnConstraint::References { table, column } => {
                            let table = foreign_key_target(&table, namespace.as_str())?.to_string();
                            validate_identifier(&table, max_len)?;
                            validate_identifier(&column, max_len)?;
                            rendered.push_str(&format!(
                                " REFERENCES {} ({})",
                                qualified_name(dialect, namespace.as_str(), &table),
                                quote_identifier(dialect, &column)
                            ));
                            references.push(BoundReference {
                                role: TableRole::Read,
                                namespace: namespace.as_str().to_string(),
                                table,
                                alias: None,
                            });
                        }
                    }
                }
            }
            column_sql.push(rendered);
        }

        let sql = format!(
            "CREATE TABLE {} ({})",
            qualified_name(dialect, namespace.as_str(), &definition.table_name),
            column_sql.join(", ")
        );

        let reparsed = self.options().statement_parser().parse_generated(&sql)?;
        if reparsed.kind != StatementKind::CreateTable {
            return Err(RewriteError::UnsupportedStatement(
                "table definition did not render a CREATE TABLE".to_string(),
            ));
        }

        tracing::debug!(tenant = %tenant, columns = column_sql.len(), "table definition rendered");
        Ok(RewrittenStatement {
            sql,
            kind: StatementKind::CreateTable,
            references,
        })
    }
}
