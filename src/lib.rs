//! # SIFT — the search-box query language
//!
//! One compact string typed into a search box becomes four things: extracted
//! identifiers, normalized free text, presentation directives, and a boolean
//! filter predicate. The predicate is pushed down to parameterized SQL when
//! every part of it translates, and evaluated in-process against rows when it
//! doesn't — never half-and-half.
//!
//! ## Quick Example
//!
//! ```
//! let query = sift::parse(r"office-chair--with-wheels-deadbeef \show=10 ?is_active");
//!
//! assert_eq!(query.identifiers, ["deadbeef"]);
//! assert_eq!(query.query_text(), "office chair-with wheels");
//! assert_eq!(query.directives.len(), 1);
//! assert_eq!(query.chains.len(), 1);
//! ```
//!
//! Compiling against a schema:
//!
//! ```
//! use std::sync::Arc;
//! use sift::schema::{Schema, TableDef, TypeResolver};
//!
//! let schema = Schema {
//!     tables: vec![TableDef::new("items").column("is_active", "boolean")],
//! };
//! let resolver = TypeResolver::new(Arc::new(schema));
//!
//! let query = sift::parse("?is_active");
//! let compiled = sift::compiler::compile(&query, "items", None, 50, &resolver);
//!
//! assert_eq!(compiled.where_fragments, ["(items.is_active = TRUE)"]);
//! ```
//!
//! ## Symbology
//!
//! | Symbol | Name      | Function                            |
//! |--------|-----------|-------------------------------------|
//! | `\`    | Directive | Paging, ordering, sampling, mode    |
//! | `?`    | Filter    | Starts the filter section / an atom |
//! | `!`    | Negate    | Inverts one filter atom             |
//! | `\|`   | Chain     | OR between AND-ed filter chains     |
//! | `=`    | Equals    | Comparison / directive value        |
//! | `[`    | Contains  | Membership (in-process only)        |

pub mod ast;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod eval;
pub mod parser;
pub mod schema;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::compiler::{compile, CompiledConditional, DEFAULT_TABLE};
    pub use crate::error::*;
    pub use crate::eval::{evaluate, PredicateRegistry, Row, RowPredicate};
    pub use crate::parser::parse;
    pub use crate::schema::{ColumnType, Schema, SchemaProvider, TypeResolver};
}

/// Parse a raw search-box query string.
///
/// Parsing is maximally forgiving and never fails: tokens that fit no
/// classification degrade to free text or are dropped with a logged
/// diagnostic.
///
/// # Example
///
/// ```
/// let query = sift::parse("hammer ?quantity>3");
/// assert_eq!(query.query_text(), "hammer");
/// assert_eq!(query.chains.len(), 1);
/// ```
pub fn parse(input: &str) -> ast::ParsedQuery {
    parser::parse(input)
}
