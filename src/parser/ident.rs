//! Identifier recognition for prefix tokens.
//!
//! Priority per token: canonical UUID, slug with a trailing short-id, bare
//! short-id, free text.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static UUID_HYPHENATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});
static UUID_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").unwrap());
static SHORT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{8}$").unwrap());
static SLUG_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)-([0-9a-fA-F]{8})$").unwrap());

/// Stand-in for a literal hyphen while single hyphens are turned into word
/// boundaries.
const HYPHEN_SENTINEL: char = '\u{1}';

/// What a prefix token turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Canonical UUID, lowercase hyphenated.
    Uuid(String),
    /// Bare 8-hex short identifier, lowercased.
    ShortId(String),
    /// Slug: free-text words fused with a trailing short id.
    Slug { words: Vec<String>, short_id: String },
    /// Plain free text, kept verbatim.
    Text(String),
}

pub fn classify(token: &str) -> TokenKind {
    if UUID_HYPHENATED.is_match(token) || UUID_BARE.is_match(token) {
        if let Ok(u) = Uuid::parse_str(token) {
            return TokenKind::Uuid(u.hyphenated().to_string());
        }
    }

    if SHORT_ID.is_match(token) {
        return TokenKind::ShortId(token.to_ascii_lowercase());
    }

    if let Some(caps) = SLUG_TAIL.captures(token) {
        // The greedy body leaves exactly the final 8 hex characters in the
        // tail group.
        let body = &caps[1];
        let short_id = caps[2].to_ascii_lowercase();
        return TokenKind::Slug {
            words: split_slug_words(body),
            short_id,
        };
    }

    TokenKind::Text(token.to_string())
}

/// Split a slug body into words: `--` is a literal hyphen inside a word, a
/// single `-` is a word boundary.
fn split_slug_words(body: &str) -> Vec<String> {
    body.replace("--", &HYPHEN_SENTINEL.to_string())
        .replace('-', " ")
        .replace(HYPHEN_SENTINEL, "-")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
