use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::ident::{classify, TokenKind};
use super::*;
use crate::ast::{FilterOp, Literal};

// ========================================================================
// Prefix: identifiers and free text
// ========================================================================

#[test]
fn test_plain_free_text() {
    let q = parse("drill press");
    assert!(q.identifiers.is_empty());
    assert_eq!(q.free_text_terms, ["drill", "press"]);
    assert_eq!(q.query_text(), "drill press");
    assert_eq!(q.raw, "drill press");
}

#[test]
fn test_hyphenated_uuid() {
    let q = parse("A1B2C3D4-E5F6-7890-ABCD-EF1234567890");
    assert_eq!(q.identifiers, ["a1b2c3d4-e5f6-7890-abcd-ef1234567890"]);
    assert_eq!(q.query_text(), "");
}

#[test]
fn test_bare_uuid_canonicalizes_to_hyphenated() {
    let q = parse("a1b2c3d4e5f67890abcdef1234567890");
    assert_eq!(q.identifiers, ["a1b2c3d4-e5f6-7890-abcd-ef1234567890"]);
}

#[test]
fn test_short_id() {
    let q = parse("DEADBEEF");
    assert_eq!(q.identifiers, ["deadbeef"]);
    assert_eq!(q.query_text(), "");
}

#[test]
fn test_slug_decomposition() {
    let q = parse("office-chair--with-wheels-deadbeef");
    assert_eq!(q.identifiers, ["deadbeef"]);
    assert_eq!(q.free_text_terms, ["office", "chair-with", "wheels"]);
}

#[test]
fn test_identifiers_keep_encounter_order() {
    let q = parse("cafebabe lamp a1b2c3d4e5f67890abcdef1234567890 deadbeef");
    assert_eq!(
        q.identifiers,
        [
            "cafebabe",
            "a1b2c3d4-e5f6-7890-abcd-ef1234567890",
            "deadbeef",
        ]
    );
    assert_eq!(q.free_text_terms, ["lamp"]);
}

#[test]
fn test_seven_hex_chars_is_free_text() {
    let q = parse("deadbee");
    assert!(q.identifiers.is_empty());
    assert_eq!(q.free_text_terms, ["deadbee"]);
}

proptest! {
    // Hyphenated and bare spellings of the same 32 hex digits canonicalize
    // to the identical identifier.
    #[test]
    fn prop_uuid_canonical_forms_agree(hex in "[0-9a-fA-F]{32}") {
        let hyphenated = format!(
            "{}-{}-{}-{}-{}",
            &hex[..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..],
        );
        let a = classify(&hex);
        let b = classify(&hyphenated);
        prop_assert_eq!(&a, &b);
        prop_assert!(matches!(a, TokenKind::Uuid(_)));
    }
}

// ========================================================================
// Directives
// ========================================================================

#[test]
fn test_directive_without_value() {
    let q = parse(r"\showall");
    assert_eq!(q.directives.len(), 1);
    assert_eq!(q.directives[0].key, "showall");
    assert!(!q.directives[0].has_value());
}

#[test]
fn test_directive_with_typed_value() {
    let q = parse(r"\show=10");
    assert_eq!(q.directives[0].key, "show");
    assert_eq!(q.directives[0].value, Some(Literal::Int(10)));
}

#[test]
fn test_directive_key_is_lowercased() {
    let q = parse(r"\ByDate");
    assert_eq!(q.directives[0].key, "bydate");
}

#[test]
fn test_bare_backslash_is_dropped() {
    let q = parse(r"lamp \ shelf");
    assert!(q.directives.is_empty());
    assert_eq!(q.free_text_terms, ["lamp", "shelf"]);
}

// ========================================================================
// Filters
// ========================================================================

#[test]
fn test_presence_atom() {
    let q = parse("?is_active");
    assert_eq!(q.chains.len(), 1);
    let atom = &q.chains[0].atoms[0];
    assert!(!atom.negated);
    assert_eq!(atom.key, "is_active");
    assert_eq!(atom.op, FilterOp::Presence);
    assert_eq!(atom.value, None);
}

#[test]
fn test_negated_atom() {
    let q = parse("?!is_deleted");
    let atom = &q.chains[0].atoms[0];
    assert!(atom.negated);
    assert_eq!(atom.key, "is_deleted");
}

#[test]
fn test_equals_atom_coerces_value() {
    let q = parse("?quantity=3");
    let atom = &q.chains[0].atoms[0];
    assert_eq!(atom.op, FilterOp::Eq);
    assert_eq!(atom.value, Some(Literal::Int(3)));
}

#[test]
fn test_comparison_atoms() {
    let q = parse("?price>9.5 ?quantity<10");
    let atoms = &q.chains[0].atoms;
    assert_eq!(atoms[0].op, FilterOp::Gt);
    assert_eq!(atoms[0].value, Some(Literal::Float(9.5)));
    assert_eq!(atoms[1].op, FilterOp::Lt);
    assert_eq!(atoms[1].value, Some(Literal::Int(10)));
}

#[test]
fn test_contains_strips_closing_bracket() {
    let q = parse("?tags[garage]");
    let atom = &q.chains[0].atoms[0];
    assert_eq!(atom.op, FilterOp::Contains);
    assert_eq!(atom.value, Some(Literal::Str("garage".to_string())));
}

#[test]
fn test_chains_split_on_pipe() {
    let q = parse("?is_active ?quantity>0 | ?due");
    assert_eq!(q.chains.len(), 2);
    assert_eq!(q.chains[0].atoms.len(), 2);
    assert_eq!(q.chains[1].atoms.len(), 1);
    assert_eq!(q.chains[1].atoms[0].key, "due");
}

#[test]
fn test_stray_text_in_filters_is_ignored() {
    let q = parse("?is_active stray");
    assert_eq!(q.chains.len(), 1);
    assert_eq!(q.chains[0].atoms.len(), 1);
}

#[test]
fn test_chain_with_no_valid_atoms_is_discarded() {
    let q = parse("?is_active | stray words");
    assert_eq!(q.chains.len(), 1);
}

#[test]
fn test_unparsable_atom_is_dropped() {
    // no key before the operator
    let q = parse("?=5 ?quantity=5");
    assert_eq!(q.chains.len(), 1);
    assert_eq!(q.chains[0].atoms.len(), 1);
    assert_eq!(q.chains[0].atoms[0].key, "quantity");
}

#[test]
fn test_filter_key_is_lowercased() {
    let q = parse("?Is_Active");
    assert_eq!(q.chains[0].atoms[0].key, "is_active");
}

// ========================================================================
// Whole queries
// ========================================================================

#[test]
fn test_prefix_and_filters_split_at_first_question_mark() {
    let q = parse(r"office-chair--with-wheels-deadbeef \show=10 ?is_active ?price>100 | ?due");
    assert_eq!(q.identifiers, ["deadbeef"]);
    assert_eq!(q.free_text_terms, ["office", "chair-with", "wheels"]);
    assert_eq!(q.directives.len(), 1);
    assert_eq!(q.chains.len(), 2);
}

#[test]
fn test_question_mark_can_fuse_with_last_term() {
    // Split happens at the character, not at a token boundary.
    let q = parse("chair?is_active");
    assert_eq!(q.free_text_terms, ["chair"]);
    assert_eq!(q.chains.len(), 1);
    assert_eq!(q.chains[0].atoms[0].key, "is_active");
}

#[test]
fn test_empty_input() {
    let q = parse("");
    assert!(q.identifiers.is_empty());
    assert!(q.free_text_terms.is_empty());
    assert!(q.directives.is_empty());
    assert!(q.chains.is_empty());
}
