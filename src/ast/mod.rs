//! Query AST.
//!
//! Everything the parser produces. A [`ParsedQuery`] is built once per input
//! string and never mutated afterwards; compilation and evaluation are pure
//! functions over it.

pub mod values;

pub use values::Literal;

use serde::{Deserialize, Serialize};

/// Filter operators. `Presence` is the bare `?key` form — a truthy or
/// existence test depending on the column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Presence,
    Eq,
    Contains,
    Gt,
    Lt,
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FilterOp::Presence => "",
            FilterOp::Eq => "=",
            FilterOp::Contains => "[",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
        };
        write!(f, "{}", s)
    }
}

/// A backslash-prefixed presentation directive: `\key` or `\key=value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    /// Lowercased, never empty.
    pub key: String,
    pub value: Option<Literal>,
}

impl Directive {
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(v) => write!(f, "\\{}={}", self.key, v),
            None => write!(f, "\\{}", self.key),
        }
    }
}

/// One `?`-prefixed filter token. Tokens that fail to parse never become
/// atoms; they are dropped by the parser with a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAtom {
    pub negated: bool,
    /// Lowercased, never empty.
    pub key: String,
    pub op: FilterOp,
    /// Always present when `op` is not `Presence`.
    pub value: Option<Literal>,
}

/// An AND-combined run of filter atoms. The overall filter predicate is an
/// OR of chains. Chains that end up with zero valid atoms are discarded
/// before they reach the compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterChain {
    pub atoms: Vec<FilterAtom>,
}

impl FilterChain {
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Ranking mode requested with `\smart` / `\dumb`. Surfaced to the caller,
/// never interpreted by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryMode {
    Smart,
    Dumb,
}

/// The aggregate parse result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// The input, verbatim.
    pub raw: String,
    /// Recognized identifiers in encounter order: canonical UUIDs
    /// (lowercase hyphenated) and 8-hex short ids (lowercase).
    pub identifiers: Vec<String>,
    /// Free-text terms in encounter order.
    pub free_text_terms: Vec<String>,
    pub directives: Vec<Directive>,
    pub chains: Vec<FilterChain>,
}

impl ParsedQuery {
    /// The space-joined free text.
    pub fn query_text(&self) -> String {
        self.free_text_terms.join(" ")
    }

    pub fn has_filters(&self) -> bool {
        !self.chains.is_empty()
    }
}
