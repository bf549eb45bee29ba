//! The query parser.
//!
//! # Syntax Overview
//!
//! ```text
//! drill press \show=10 \bydate ?is_active ?price>100 | ?due
//! ─────┬───── ────┬──────────  ──────────┬────────────────
//!      │          │                      │
//!      │          │                      └── Filters: chains OR-ed on `|`,
//!      │          │                          atoms AND-ed within a chain
//!      │          └── Directives (paging, ordering, mode)
//!      └── Prefix: identifiers and free text
//! ```
//!
//! The raw string splits at the first `?`. Prefix tokens are classified as
//! directives, identifiers, or free text; the filter suffix splits on `|`
//! into chains. Parsing never fails — anything unclassifiable degrades to
//! free text or is dropped with a diagnostic.

pub mod ident;
pub mod tokens;

#[cfg(test)]
mod tests;

use tracing::{debug, warn};

use crate::ast::{FilterChain, ParsedQuery};
use ident::TokenKind;

/// Parse a raw search-box string into a [`ParsedQuery`].
pub fn parse(input: &str) -> ParsedQuery {
    let mut query = ParsedQuery {
        raw: input.to_string(),
        ..Default::default()
    };

    let (prefix, filters) = match input.find('?') {
        Some(pos) => (&input[..pos], Some(&input[pos..])),
        None => (input, None),
    };

    for token in prefix.split_whitespace() {
        if token.starts_with('\\') {
            match tokens::parse_directive(token) {
                Some(d) => query.directives.push(d),
                None => warn!(token, "dropping malformed directive"),
            }
            continue;
        }

        match ident::classify(token) {
            TokenKind::Uuid(id) => query.identifiers.push(id),
            TokenKind::ShortId(id) => query.identifiers.push(id),
            TokenKind::Slug { words, short_id } => {
                query.identifiers.push(short_id);
                query.free_text_terms.extend(words);
            }
            TokenKind::Text(t) => query.free_text_terms.push(t),
        }
    }

    if let Some(filters) = filters {
        for chain_text in filters.split('|') {
            let mut chain = FilterChain::default();
            for token in chain_text.split_whitespace() {
                if !token.starts_with('?') {
                    // Stray text between atoms, e.g. a misplaced search term.
                    warn!(token, "ignoring stray text in filter section");
                    continue;
                }
                match tokens::parse_filter_atom(token) {
                    Some(atom) => chain.atoms.push(atom),
                    None => warn!(token, "dropping unparsable filter atom"),
                }
            }
            if chain.is_empty() {
                debug!("discarding filter chain with no valid atoms");
            } else {
                query.chains.push(chain);
            }
        }
    }

    query
}
