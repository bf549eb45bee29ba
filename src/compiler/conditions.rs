//! Per-atom SQL condition construction.
//!
//! Key resolution order: exact column, `is_<key>` boolean convention,
//! synthetic predicates for the default table, `has_<column>` convention.
//! Anything else is unconvertible and the owning chain goes residual.

use chrono::NaiveDate;

use crate::ast::{FilterAtom, FilterChain, FilterOp, Literal};
use crate::schema::{ColumnType, ColumnTypes};

use super::DEFAULT_TABLE;

/// Bit positions in the `items.flags` bitmask.
pub const FLAG_ARCHIVED: i64 = 1;

/// Date spellings accepted for timestamp comparisons, normalized to
/// `YYYY-MM-DD` before binding.
const DATE_FORMATS: [&str; 4] = ["%Y/%m/%d", "%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"];

/// Collects named bind parameters for one compile call.
///
/// Names restart at zero per call so that compiling the same query twice
/// against an unchanged schema yields structurally identical output. Values
/// only ever travel through here — never into the SQL text.
#[derive(Debug, Default)]
pub struct ParamContext {
    index: usize,
    params: Vec<(String, Literal)>,
}

impl ParamContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value and return its placeholder (`:p0`, `:p1`, ...).
    pub fn bind(&mut self, value: Literal) -> String {
        let name = format!("p{}", self.index);
        self.index += 1;
        self.params.push((name.clone(), value));
        format!(":{}", name)
    }

    pub fn into_params(self) -> Vec<(String, Literal)> {
        self.params
    }
}

/// One fully converted chain.
pub(crate) struct ChainSql {
    pub expr: String,
    pub keys: Vec<String>,
    pub columns: Vec<String>,
}

/// A single converted atom.
struct BuiltCondition {
    sql: String,
    /// The real column referenced, when there is one (synthetic predicates
    /// reference join tables instead).
    column: Option<String>,
}

/// Convert a whole chain, or nothing: a chain compiles only if every atom
/// in it converts.
pub(crate) fn convert_chain(
    chain: &FilterChain,
    types: &ColumnTypes,
    table: &str,
    alias: &str,
    ctx: &mut ParamContext,
) -> Option<ChainSql> {
    let mut exprs = Vec::new();
    let mut keys = Vec::new();
    let mut columns = Vec::new();

    for atom in &chain.atoms {
        let cond = convert_atom(atom, types, table, alias, ctx)?;
        exprs.push(cond.sql);
        keys.push(atom.key.clone());
        if let Some(col) = cond.column {
            columns.push(col);
        }
    }

    Some(ChainSql {
        expr: exprs.join(" AND "),
        keys,
        columns,
    })
}

fn convert_atom(
    atom: &FilterAtom,
    types: &ColumnTypes,
    table: &str,
    alias: &str,
    ctx: &mut ParamContext,
) -> Option<BuiltCondition> {
    if let Some(&ty) = types.get(&atom.key) {
        return build_column_condition(&atom.key, ty, atom, alias, ctx);
    }

    let boolish = format!("is_{}", atom.key);
    if types.get(&boolish) == Some(&ColumnType::Boolean) {
        return build_column_condition(&boolish, ColumnType::Boolean, atom, alias, ctx);
    }

    if table == DEFAULT_TABLE && atom.op == FilterOp::Presence {
        if let Some(sql) = synthetic_predicate(&atom.key, alias) {
            let sql = if atom.negated {
                format!("NOT ({})", sql)
            } else {
                sql
            };
            return Some(BuiltCondition { sql, column: None });
        }
    }

    if atom.op == FilterOp::Presence {
        if let Some(col) = atom.key.strip_prefix("has_") {
            if let Some(&ty) = types.get(col) {
                return Some(build_non_blank(col, ty, atom.negated, alias));
            }
        }
    }

    None
}

fn build_column_condition(
    col: &str,
    ty: ColumnType,
    atom: &FilterAtom,
    alias: &str,
    ctx: &mut ParamContext,
) -> Option<BuiltCondition> {
    let q = format!("{}.{}", alias, col);

    let sql = match atom.op {
        FilterOp::Presence => match ty {
            // Direct polarity flip, not a wrapped NOT.
            ColumnType::Boolean => {
                if atom.negated {
                    format!("{} = FALSE", q)
                } else {
                    format!("{} = TRUE", q)
                }
            }
            _ => return None,
        },

        FilterOp::Eq => {
            let value = atom.value.as_ref()?;
            if value.is_null() {
                if atom.negated {
                    format!("{} IS NOT NULL", q)
                } else {
                    format!("{} IS NULL", q)
                }
            } else {
                let bound = match ty {
                    ColumnType::Boolean => Literal::Bool(value.coerce_bool()?),
                    ColumnType::Timestamp => normalize_timestamp(value),
                    _ => value.clone(),
                };
                let placeholder = ctx.bind(bound);
                if atom.negated {
                    format!("{} <> {}", q, placeholder)
                } else {
                    format!("{} = {}", q, placeholder)
                }
            }
        }

        FilterOp::Gt | FilterOp::Lt => {
            if !ty.is_orderable() {
                return None;
            }
            let value = atom.value.as_ref()?;
            let bound = if ty == ColumnType::Timestamp {
                normalize_timestamp(value)
            } else {
                value.clone()
            };
            let placeholder = ctx.bind(bound);
            let op = if atom.op == FilterOp::Gt { ">" } else { "<" };
            let cmp = format!("{} {} {}", q, op, placeholder);
            if atom.negated {
                format!("NOT ({})", cmp)
            } else {
                cmp
            }
        }

        // Membership is only meaningful against in-memory collections.
        FilterOp::Contains => return None,
    };

    Some(BuiltCondition {
        sql,
        column: Some(col.to_string()),
    })
}

/// `has_<column>`: non-null for most types, non-blank after trimming for
/// text.
fn build_non_blank(col: &str, ty: ColumnType, negated: bool, alias: &str) -> BuiltCondition {
    let q = format!("{}.{}", alias, col);
    let sql = match ty {
        ColumnType::Text => {
            let present = format!("COALESCE(TRIM({}), '') <> ''", q);
            if negated {
                format!("NOT ({})", present)
            } else {
                present
            }
        }
        _ => {
            if negated {
                format!("{} IS NULL", q)
            } else {
                format!("{} IS NOT NULL", q)
            }
        }
    };
    BuiltCondition {
        sql,
        column: Some(col.to_string()),
    }
}

/// Synthetic predicates for the default table. Pure trusted SQL against the
/// join tables; nothing user-supplied appears here.
fn synthetic_predicate(key: &str, alias: &str) -> Option<String> {
    let sql = match key {
        // no relation row touches the item at all
        "orphan" => format!(
            "NOT EXISTS (SELECT 1 FROM item_relations r \
             WHERE r.source_id = {a}.id OR r.target_id = {a}.id)",
            a = alias
        ),
        // nothing contains the item
        "uncontained" => format!(
            "NOT EXISTS (SELECT 1 FROM item_relations r \
             WHERE r.target_id = {a}.id AND r.relation = 'contains')",
            a = alias
        ),
        // a reminder has come due
        "due" => format!(
            "EXISTS (SELECT 1 FROM reminders m \
             WHERE m.item_id = {a}.id AND m.remind_at <= CURRENT_TIMESTAMP)",
            a = alias
        ),
        // at least one linked invoice or image
        "attached" => format!(
            "EXISTS (SELECT 1 FROM attachments t WHERE t.item_id = {a}.id)",
            a = alias
        ),
        "archived" => format!("({}.flags & {}) <> 0", alias, FLAG_ARCHIVED),
        _ => return None,
    };
    Some(sql)
}

/// Normalize accepted date spellings to `YYYY-MM-DD`; anything else binds
/// unchanged.
fn normalize_timestamp(value: &Literal) -> Literal {
    if let Literal::Str(s) = value {
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Literal::Str(d.format("%Y-%m-%d").to_string());
            }
        }
    }
    value.clone()
}
