//! # tenantsql-rewrite
//!
//! Confines SQL statements to the namespace of the tenant that issued them.
//!
//! Every tenant owns a namespace (a Postgres schema, a MySQL database) in one
//! shared database. Statements are parsed with `sqlparser`, every table
//! reference is bound into the tenant's namespace, and the tree is rendered
//! back to SQL. String matching is never involved.
//!
//! ## How It Works
//!
//! **Before (from tenant 7):**
//! ```sql
//! SELECT * FROM orders o JOIN customers c ON o.cid = c.id
//! ```
//!
//! **After (to the database):**
//! ```sql
//! SELECT * FROM "user_7"."orders" AS o JOIN "user_7"."customers" AS c ON o.cid = c.id
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Parse | [`parser`] | one statement of an allowed kind |
//! | Collect | [`collector`] | table references with roles |
//! | Bind | [`binder`] | references resolved into the namespace |
//! | Reconstruct | [`reconstruct`] | rewritten SQL text |
//!
//! [`TenantRewriter`] runs the pipeline and is the only entry point callers
//! need. It also renders structured table definitions ([`definition`]) and
//! the table lifecycle and catalog statements ([`catalog`]).
//!
//! ## Rejections
//!
//! | Kind | Cause |
//! |------|-------|
//! | `parse_error` | not a single well-formed statement |
//! | `unsupported_statement` | statement kind or construct outside the allow-list |
//! | `invalid_identifier` | a name fails the identifier rule |
//! | `namespace_escape` | an explicit qualifier names another namespace |
//!
//! ## Example
//!
//! ```rust
//! use tenantsql_core::TenantId;
//! use tenantsql_rewrite::TenantRewriter;
//!
//! let rewriter = TenantRewriter::default();
//! let out = rewriter.rewrite("DELETE FROM orders WHERE id = 1", &TenantId::from(7u64)).unwrap();
//! assert_eq!(out.sql, "DELETE FROM \"user_7\".\"orders\" WHERE id = 1");
//! ```

pub mod binder;
pub mod catalog;
pub mod collector;
pub mod definition;
pub mod dialect;
pub mod error;
pub mod identifier;
pub mod parser;
pub mod reconstruct;
pub mod rewriter;

pub use binder::{BoundReference, NamespaceBinder};
pub use collector::{CollectedStatement, ReferenceCollector, TableReference, TableRole};
pub use definition::{ColumnConstraint, ColumnDefinition, ColumnType, TableDefinition};
pub use error::{ExecutionError, Rejection, RejectionKind, RewriteError};
pub use identifier::validate_identifier;
pub use parser::{ParsedStatement, StatementKind, StatementParser};
pub use reconstruct::Reconstructor;
pub use rewriter::{ExecutionRequest, RewriteOptions, RewrittenStatement, TenantRewriter};
