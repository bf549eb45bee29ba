//! In-process row evaluation.
//!
//! Used when SQL compilation was not attempted or came back residual: the
//! same filter chains are applied directly to rows. A row with no chains to
//! satisfy is accepted; otherwise at least one chain must have every atom
//! evaluate true. Atom evaluation never propagates errors — anything that
//! cannot be read or compared counts as false, the closed-world "missing
//! means excluded" policy.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::ast::{FilterAtom, FilterOp, Literal, ParsedQuery};
use crate::compiler::FLAG_ARCHIVED;

/// A row, as the executor hands it back.
pub type Row = serde_json::Map<String, Value>;

/// A computed predicate registered under a filter key.
///
/// Handlers see the positive form; negation is applied by the evaluator
/// after the handler returns.
pub trait RowPredicate: Send + Sync {
    fn evaluate(&self, row: &Row, op: FilterOp, value: Option<&Literal>) -> bool;
}

/// Closure adapter for [`RowPredicate`].
pub struct FnPredicate<F>(pub F);

impl<F> RowPredicate for FnPredicate<F>
where
    F: Fn(&Row, FilterOp, Option<&Literal>) -> bool + Send + Sync,
{
    fn evaluate(&self, row: &Row, op: FilterOp, value: Option<&Literal>) -> bool {
        (self.0)(row, op, value)
    }
}

/// String-keyed predicate dispatch. Hosts add computed predicates without
/// touching the evaluator core.
pub struct PredicateRegistry {
    handlers: HashMap<String, Box<dyn RowPredicate>>,
}

impl PredicateRegistry {
    /// A registry with no handlers at all.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with the built-in computed predicates for the default
    /// table — the ones computable from row fields alone. Predicates that
    /// need join data (`orphan`, `uncontained`, `attached`) are the host's
    /// to register.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "due",
            Box::new(FnPredicate(|row: &Row, _op: FilterOp, _value: Option<&Literal>| {
                match row.get("remind_at").and_then(json_timestamp) {
                    Some(t) => t <= Utc::now(),
                    None => false,
                }
            })),
        );
        registry.register(
            "archived",
            Box::new(FnPredicate(|row: &Row, _op: FilterOp, _value: Option<&Literal>| {
                match row.get("flags").and_then(Value::as_i64) {
                    Some(flags) => flags & FLAG_ARCHIVED != 0,
                    None => false,
                }
            })),
        );
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, predicate: Box<dyn RowPredicate>) {
        self.handlers.insert(key.into(), predicate);
    }

    fn get(&self, key: &str) -> Option<&dyn RowPredicate> {
        self.handlers.get(key).map(|p| p.as_ref())
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Evaluate the parsed filter chains against one row.
pub fn evaluate(query: &ParsedQuery, row: &Row, registry: &PredicateRegistry) -> bool {
    if query.chains.is_empty() {
        return true;
    }
    query
        .chains
        .iter()
        .any(|chain| chain.atoms.iter().all(|atom| evaluate_atom(atom, row, registry)))
}

fn evaluate_atom(atom: &FilterAtom, row: &Row, registry: &PredicateRegistry) -> bool {
    if let Some(handler) = registry.get(&atom.key) {
        let result = handler.evaluate(row, atom.op, atom.value.as_ref());
        return if atom.negated { !result } else { result };
    }

    match evaluate_raw(atom, row) {
        Some(result) => {
            if atom.negated {
                !result
            } else {
                result
            }
        }
        // Missing field or failed comparison: the atom is false outright,
        // negated or not.
        None => false,
    }
}

fn evaluate_raw(atom: &FilterAtom, row: &Row) -> Option<bool> {
    let value = row.get(&atom.key)?;
    match atom.op {
        FilterOp::Presence => Some(truthy(value)),
        FilterOp::Eq => Some(loose_eq(value, atom.value.as_ref()?)),
        FilterOp::Gt => compare(value, atom.value.as_ref()?).map(|o| o == Ordering::Greater),
        FilterOp::Lt => compare(value, atom.value.as_ref()?).map(|o| o == Ordering::Less),
        FilterOp::Contains => Some(contains(value, atom.value.as_ref()?)),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn loose_eq(row_value: &Value, wanted: &Literal) -> bool {
    match (row_value, wanted) {
        (Value::Null, Literal::Null) => true,
        (Value::Null, _) | (_, Literal::Null) => false,
        (Value::Bool(b), w) => w.coerce_bool() == Some(*b),
        _ => {
            if let (Some(a), Some(b)) = (json_num(row_value), wanted.as_f64()) {
                return a == b;
            }
            json_text(row_value) == wanted.to_text()
        }
    }
}

/// Numeric coercion first, string comparison second.
fn compare(row_value: &Value, wanted: &Literal) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (json_num(row_value), wanted.as_f64()) {
        return a.partial_cmp(&b);
    }
    match row_value {
        Value::String(s) => Some(s.as_str().cmp(wanted.to_text().as_str())),
        _ => None,
    }
}

fn contains(row_value: &Value, wanted: &Literal) -> bool {
    match row_value {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, wanted)),
        Value::String(s) => s.contains(&wanted.to_text()),
        _ => false,
    }
}

fn json_num(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_timestamp(v: &Value) -> Option<DateTime<Utc>> {
    let s = v.as_str()?;
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}
