//! Identifier safety rules.
//!
//! Every table, column and type name that ends up in emitted SQL passes
//! through [`validate_identifier`]. The rule is deliberately narrower than
//! what any database accepts:
//!
//! - first character is an ASCII letter or underscore
//! - remaining characters are ASCII letters, digits or underscores
//! - length is bounded
//! - the word is not a statement keyword
//!
//! There is no configuration switch that relaxes it.

use crate::error::RewriteError;

/// Words that may never name a table or column, even quoted.
const STATEMENT_KEYWORDS: &[&str] = &[
    "ALTER", "COPY", "CREATE", "DELETE", "DROP", "EXEC", "EXECUTE", "GRANT", "INSERT", "REVOKE",
    "SELECT", "TRUNCATE", "UNION", "UPDATE",
];

/// Check an identifier against the safety pattern.
pub fn validate_identifier(value: &str, max_length: usize) -> Result<(), RewriteError> {
    if value.is_empty() {
        return Err(RewriteError::InvalidIdentifier(
            "identifier must not be empty".to_string(),
        ));
    }
    if value.len() > max_length {
        return Err(RewriteError::InvalidIdentifier(format!(
            "identifier longer than {max_length} characters"
        )));
    }

    let mut bytes = value.bytes();
    let valid_start = matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic() || b == b'_');
    let valid_rest = bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !valid_start || !valid_rest {
        // The offending text is not echoed back.
        return Err(RewriteError::InvalidIdentifier(
            "identifiers may only contain letters, digits and underscores and must not start with a digit"
                .to_string(),
        ));
    }

    if STATEMENT_KEYWORDS
        .iter()
        .any(|kw| kw.eq_ignore_ascii_case(value))
    {
        return Err(RewriteError::InvalidIdentifier(
            "identifier is a reserved statement keyword".to_string(),
        ));
    }

    Ok(())
}
