//! Statement parsing and the statement-kind allow-list.

use sqlparser::ast::{Ident, ObjectType, Statement};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer};
use tenantsql_core::SqlDialect;

use crate::dialect::parser_dialect;
use crate::error::RewriteError;

/// Default nesting limit handed to sqlparser's recursive descent.
pub const DEFAULT_RECURSION_LIMIT: usize = 50;

pub const DEFAULT_MAX_STATEMENT_BYTES: usize = 256 * 1024;

pub const DEFAULT_MAX_OPERATORS: usize = 1000;

/// Unquoted words that act as infix or prefix operators.
const OPERATOR_WORDS: &[&str] = &[
    "AND", "OR", "XOR", "NOT", "IS", "IN", "LIKE", "ILIKE", "SIMILAR", "RLIKE", "REGEXP",
    "BETWEEN", "COLLATE", "DIV", "AT",
];

/// Words that make a CREATE TABLE reach outside its own table.
const CREATE_TABLE_DENIED_WORDS: &[&str] = &["REFERENCES", "INHERITS", "PARTITION"];

/// Words that make an ALTER TABLE reach outside its own table or namespace.
const ALTER_TABLE_DENIED_WORDS: &[&str] = &[
    "REFERENCES",
    "INHERIT",
    "INHERITS",
    "PARTITION",
    "SCHEMA",
    "OWNER",
];

/// The eight supported top-level statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
    DropTable,
    AlterTable,
    TruncateTable,
}

impl StatementKind {
    /// Whether this is a table lifecycle (DDL) statement.
    pub fn is_ddl(self) -> bool {
        matches!(
            self,
            StatementKind::CreateTable
                | StatementKind::DropTable
                | StatementKind::AlterTable
                | StatementKind::TruncateTable
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::DropTable => "DROP TABLE",
            StatementKind::AlterTable => "ALTER TABLE",
            StatementKind::TruncateTable => "TRUNCATE TABLE",
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed statement of an allowed kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub statement: Statement,
    pub kind: StatementKind,
    /// Quoted identifiers as they appeared in the token stream, including
    /// positions the syntax tree does not expose as expressions.
    pub quoted_identifiers: Vec<Ident>,
}

/// Parses raw SQL into exactly one allowed statement.
#[derive(Debug, Clone, Copy)]
pub struct StatementParser {
    dialect: SqlDialect,
    recursion_limit: usize,
    max_statement_bytes: usize,
    max_operators: usize,
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new(SqlDialect::default())
    }
}

impl StatementParser {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            max_statement_bytes: DEFAULT_MAX_STATEMENT_BYTES,
            max_operators: DEFAULT_MAX_OPERATORS,
        }
    }

    /// Size the parser's recursion limit for a subquery depth bound.
    ///
    /// One query level costs the parser several frames, so the limit is kept
    /// well above `max_depth` and the collector reports the depth violation.
    pub fn for_max_depth(dialect: SqlDialect, max_depth: usize) -> Self {
        Self {
            recursion_limit: max_depth.saturating_mul(4).max(DEFAULT_RECURSION_LIMIT),
            ..Self::new(dialect)
        }
    }

    /// Bound the statement text and its operator count.
    ///
    /// sqlparser folds `a + b + c ...` iteratively, so the recursion limit
    /// never sees such chains, but the tree it builds is as deep as the
    /// chain is long.
    pub fn with_size_limits(mut self, max_statement_bytes: usize, max_operators: usize) -> Self {
        self.max_statement_bytes = max_statement_bytes;
        self.max_operators = max_operators;
        self
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Parse `sql` into a single statement and check it against the allow-list.
    pub fn parse(&self, sql: &str) -> Result<ParsedStatement, RewriteError> {
        let tokens = self.tokenize(sql)?;
        let parsed = self.parse_tokens(tokens.clone())?;
        check_constructs(&parsed.statement, parsed.kind, &tokens)?;

        tracing::trace!(kind = %parsed.kind, "statement parsed");
        Ok(parsed)
    }

    /// Parse SQL the engine rendered itself.
    ///
    /// Only the statement count and kind are checked; the construct checks
    /// would reject the qualified foreign keys the definition path emits.
    pub(crate) fn parse_generated(&self, sql: &str) -> Result<ParsedStatement, RewriteError> {
        let tokens = self.tokenize(sql)?;
        self.parse_tokens(tokens)
    }

    fn tokenize(&self, sql: &str) -> Result<Vec<TokenWithSpan>, RewriteError> {
        if sql.trim().is_empty() {
            return Err(RewriteError::Parse("empty statement".to_string()));
        }
        if sql.len() > self.max_statement_bytes {
            return Err(RewriteError::Parse(format!(
                "statement is longer than {} bytes",
                self.max_statement_bytes
            )));
        }

        let dialect = parser_dialect(self.dialect);
        let tokens = Tokenizer::new(dialect.as_ref(), sql)
            .tokenize_with_location()
            .map_err(|e| RewriteError::Parse(e.to_string()))?;

        let operators = tokens.iter().filter(|t| is_operator(&t.token)).count();
        if operators > self.max_operators {
            return Err(RewriteError::Parse(format!(
                "statement has more than {} operators",
                self.max_operators
            )));
        }
        Ok(tokens)
    }

    fn parse_tokens(&self, tokens: Vec<TokenWithSpan>) -> Result<ParsedStatement, RewriteError> {
        let quoted_identifiers = quoted_words(&tokens);

        let dialect = parser_dialect(self.dialect);
        let mut parser = Parser::new(dialect.as_ref())
            .with_recursion_limit(self.recursion_limit)
            .with_tokens_with_locations(tokens);
        let mut statements = parser
            .parse_statements()
            .map_err(|e| RewriteError::Parse(e.to_string()))?;

        let statement = match statements.len() {
            0 => return Err(RewriteError::Parse("empty statement".to_string())),
            1 => statements.remove(0),
            n => {
                return Err(RewriteError::UnsupportedStatement(format!(
                    "expected exactly 1 statement, got {n}"
                )));
            }
        };

        let kind = classify(&statement)?;
        Ok(ParsedStatement {
            statement,
            kind,
            quoted_identifiers,
        })
    }
}

/// Whether a token joins or prefixes operands, each of which adds a level to
/// the expression tree. Unknown tokens count.
fn is_operator(token: &Token) -> bool {
    match token {
        Token::Word(word) => {
            word.quote_style.is_none()
                && OPERATOR_WORDS
                    .iter()
                    .any(|w| w.eq_ignore_ascii_case(&word.value))
        }
        Token::EOF
        | Token::Number(..)
        | Token::Char(_)
        | Token::Whitespace(_)
        | Token::Comma
        | Token::Period
        | Token::SemiColon
        | Token::LParen
        | Token::RParen
        | Token::LBracket
        | Token::RBracket
        | Token::LBrace
        | Token::RBrace
        | Token::Placeholder(_)
        | Token::SingleQuotedString(_)
        | Token::DoubleQuotedString(_)
        | Token::TripleSingleQuotedString(_)
        | Token::TripleDoubleQuotedString(_)
        | Token::DollarQuotedString(_)
        | Token::SingleQuotedByteStringLiteral(_)
        | Token::DoubleQuotedByteStringLiteral(_)
        | Token::TripleSingleQuotedByteStringLiteral(_)
        | Token::TripleDoubleQuotedByteStringLiteral(_)
        | Token::SingleQuotedRawStringLiteral(_)
        | Token::DoubleQuotedRawStringLiteral(_)
        | Token::TripleSingleQuotedRawStringLiteral(_)
        | Token::TripleDoubleQuotedRawStringLiteral(_)
        | Token::NationalStringLiteral(_)
        | Token::EscapedStringLiteral(_)
        | Token::UnicodeStringLiteral(_)
        | Token::HexStringLiteral(_) => false,
        _ => true,
    }
}

/// Every quoted word in the statement, wherever the parser puts it.
fn quoted_words(tokens: &[TokenWithSpan]) -> Vec<Ident> {
    tokens
        .iter()
        .filter_map(|t| match &t.token {
            Token::Word(word) => word
                .quote_style
                .map(|quote| Ident::with_quote(quote, word.value.clone())),
            _ => None,
        })
        .collect()
}

/// Map a statement onto the allow-list.
pub fn classify(statement: &Statement) -> Result<StatementKind, RewriteError> {
    let kind = match statement {
        Statement::Query(_) => StatementKind::Select,
        Statement::Insert { .. } => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete { .. } => StatementKind::Delete,
        Statement::CreateTable { .. } => StatementKind::CreateTable,
        Statement::AlterTable { .. } => StatementKind::AlterTable,
        Statement::Truncate { .. } => StatementKind::TruncateTable,
        Statement::Drop {
            object_type: ObjectType::Table,
            ..
        } => StatementKind::DropTable,
        Statement::Drop { .. } => {
            return Err(RewriteError::UnsupportedStatement(
                "only DROP TABLE is supported".to_string(),
            ));
        }
        _ => {
            return Err(RewriteError::UnsupportedStatement(
                "statement kind is not allowed".to_string(),
            ));
        }
    };
    Ok(kind)
}

/// Reject constructs inside allowed kinds that reference tables the
/// collector cannot bind.
fn check_constructs(
    statement: &Statement,
    kind: StatementKind,
    tokens: &[TokenWithSpan],
) -> Result<(), RewriteError> {
    match statement {
        Statement::CreateTable(create) => {
            if create.temporary {
                return Err(RewriteError::UnsupportedStatement(
                    "temporary tables cannot be placed in a tenant namespace".to_string(),
                ));
            }
            if create.like.is_some() || create.clone.is_some() {
                return Err(RewriteError::UnsupportedStatement(
                    "CREATE TABLE ... LIKE/CLONE is not supported".to_string(),
                ));
            }
        }
        Statement::Delete(delete) => {
            if !delete.tables.is_empty() {
                return Err(RewriteError::UnsupportedStatement(
                    "multi-table DELETE is not supported".to_string(),
                ));
            }
        }
        _ => {}
    }

    let denied = match kind {
        StatementKind::CreateTable => CREATE_TABLE_DENIED_WORDS,
        StatementKind::AlterTable => ALTER_TABLE_DENIED_WORDS,
        _ => return Ok(()),
    };
    let tokens: Vec<&Token> = tokens.iter().map(|t| &t.token).collect();
    if let Some(word) = first_denied_word(&tokens, denied) {
        return Err(RewriteError::UnsupportedStatement(format!(
            "{word} clauses are not supported in {kind}"
        )));
    }
    if kind == StatementKind::AlterTable && renames_into_qualified_name(&tokens) {
        return Err(RewriteError::UnsupportedStatement(
            "a table can only be renamed within its namespace".to_string(),
        ));
    }
    Ok(())
}

fn unquoted_word(token: &Token) -> Option<&str> {
    match token {
        Token::Word(word) if word.quote_style.is_none() => Some(word.value.as_str()),
        _ => None,
    }
}

/// Find the first unquoted word token from `denied`.
///
/// Works on the token stream, so string literals and quoted identifiers
/// never match.
fn first_denied_word(tokens: &[&Token], denied: &'static [&'static str]) -> Option<&'static str> {
    tokens.iter().copied().filter_map(unquoted_word).find_map(|value| {
        denied
            .iter()
            .find(|d| d.eq_ignore_ascii_case(value))
            .copied()
    })
}

/// `RENAME [TO|AS] ns.t` would move the table out of the namespace.
fn renames_into_qualified_name(tokens: &[&Token]) -> bool {
    let Some(rename_at) = tokens
        .iter()
        .position(|t| unquoted_word(t).is_some_and(|w| w.eq_ignore_ascii_case("RENAME")))
    else {
        return false;
    };
    tokens[rename_at..].iter().any(|t| matches!(t, Token::Period))
}
