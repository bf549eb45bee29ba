//! The SQL conditional compiler.
//!
//! Turns a [`ParsedQuery`] plus a table context into everything a SQL
//! executor needs: a WHERE fragment, ordering, paging, and named bind
//! parameters. Conversion is all-or-nothing across chains — the filter
//! predicate is an OR of chains, and pushing down only some disjuncts would
//! silently change its meaning. When any chain fails to convert, every chain
//! is reported residual and must go through [`crate::eval`] instead.

pub mod conditions;


use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::ast::{FilterChain, Literal, ParsedQuery, QueryMode};
use crate::schema::TypeResolver;

pub use conditions::{ParamContext, FLAG_ARCHIVED};

/// The table synthetic predicates apply to.
pub const DEFAULT_TABLE: &str = "items";

/// Everything the SQL executor needs, in one fixed record.
///
/// Consumption contract: join `where_fragments` with `AND`, join `order_by`
/// with `,`, append `LIMIT`/`OFFSET` only when present, and bind every named
/// parameter. No value from a [`Literal`] ever appears in the SQL text;
/// only trusted column and table names do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledConditional {
    pub table: String,
    pub table_alias: String,
    /// WHERE fragments; empty when nothing pushed down.
    pub where_fragments: Vec<String>,
    pub order_by: Vec<String>,
    pub limit: Option<i64>,
    /// True when a `\show=N` directive set the limit, as opposed to the
    /// caller-supplied default.
    pub limit_is_explicit: bool,
    pub offset: Option<i64>,
    /// Named bind parameters in placeholder order.
    pub bound_params: Vec<(String, Literal)>,
    /// Real columns referenced by pushed-down conditions.
    pub touched_columns: BTreeSet<String>,
    /// Filter keys actually pushed down; empty whenever any chain is
    /// residual.
    pub applied_filter_keys: Vec<String>,
    /// Chains the caller must evaluate in-process.
    pub residual_chains: Vec<FilterChain>,
    /// `\smart` / `\dumb`, surfaced but not interpreted.
    pub mode: Option<QueryMode>,
}

enum LimitState {
    Default,
    Disabled,
    Explicit(i64),
}

/// Compile a parsed query against a table.
///
/// The caller supplies the table/alias context and the default page size;
/// nothing is hard-coded here. Never fails — whatever cannot be pushed down
/// comes back in `residual_chains`.
pub fn compile(
    query: &ParsedQuery,
    table: &str,
    table_alias: Option<&str>,
    default_limit: i64,
    resolver: &TypeResolver,
) -> CompiledConditional {
    let alias = table_alias.unwrap_or(table);
    let types = resolver.resolve(table);

    // Directive folding. Later directives override earlier ones of the same
    // kind; unknown or malformed ones are ignored.
    let mut limit_state = LimitState::Default;
    let mut page: Option<i64> = None;
    let mut order_col: Option<&str> = None;
    let mut random_order = false;
    let mut reversed = false;
    let mut mode: Option<QueryMode> = None;

    let (bydate_col, bydatem_col, fallback_col) = ordering_columns(table);

    for d in &query.directives {
        match (d.key.as_str(), &d.value) {
            ("showall", _) => limit_state = LimitState::Disabled,
            ("show", Some(Literal::Int(n))) if *n > 0 => limit_state = LimitState::Explicit(*n),
            ("page", Some(Literal::Int(n))) if *n >= 1 => page = Some(*n),
            ("bydate", _) => order_col = Some(bydate_col),
            ("bydatem", _) => order_col = Some(bydatem_col),
            ("byrand", _) => random_order = true,
            ("orderrev", _) => reversed = true,
            ("smart", _) => mode = Some(QueryMode::Smart),
            ("dumb", _) => mode = Some(QueryMode::Dumb),
            _ => debug!(key = %d.key, "ignoring unknown or malformed directive"),
        }
    }

    let (limit, limit_is_explicit) = match limit_state {
        LimitState::Default => (Some(default_limit), false),
        LimitState::Disabled => (None, false),
        LimitState::Explicit(n) => (Some(n), true),
    };

    // Offset only applies while a limit is active.
    let offset = match (page, limit) {
        (Some(p), Some(l)) if (p - 1) * l > 0 => Some((p - 1) * l),
        _ => None,
    };

    // Random ordering beats everything; an explicit ordering column ignores
    // `\orderrev`; the default fallback ordering honors it.
    let order_by = if random_order {
        vec!["random()".to_string()]
    } else if let Some(col) = order_col {
        vec![format!("{}.{} DESC", alias, col)]
    } else {
        let dir = if reversed { "ASC" } else { "DESC" };
        vec![format!("{}.{} {}", alias, fallback_col, dir)]
    };

    // Chain conversion.
    let mut ctx = ParamContext::new();
    let mut converted = Vec::new();
    let mut all_convertible = true;
    for chain in &query.chains {
        match conditions::convert_chain(chain, &types, table, alias, &mut ctx) {
            Some(c) => converted.push(c),
            None => {
                all_convertible = false;
                warn!(?chain, "chain not convertible to SQL");
            }
        }
    }

    let mut compiled = CompiledConditional {
        table: table.to_string(),
        table_alias: alias.to_string(),
        where_fragments: Vec::new(),
        order_by,
        limit,
        limit_is_explicit,
        offset,
        bound_params: Vec::new(),
        touched_columns: BTreeSet::new(),
        applied_filter_keys: Vec::new(),
        residual_chains: Vec::new(),
        mode,
    };

    if query.chains.is_empty() {
        return compiled;
    }

    if all_convertible {
        let fragment = converted
            .iter()
            .map(|c| format!("({})", c.expr))
            .collect::<Vec<_>>()
            .join(" OR ");
        compiled.where_fragments.push(fragment);
        compiled.bound_params = ctx.into_params();
        for c in converted {
            compiled.touched_columns.extend(c.columns);
            for key in c.keys {
                if !compiled.applied_filter_keys.contains(&key) {
                    compiled.applied_filter_keys.push(key);
                }
            }
        }
    } else {
        // One unconvertible chain poisons the whole OR: dropping a disjunct
        // from SQL while keeping the others would return wrong rows.
        debug!("discarding partial push-down; all chains go residual");
        compiled.residual_chains = query.chains.clone();
    }

    compiled
}

/// Table-specific ordering columns: (`\bydate`, `\bydatem`, fallback).
fn ordering_columns(table: &str) -> (&'static str, &'static str, &'static str) {
    match table {
        "reminders" => ("remind_at", "created_at", "remind_at"),
        _ => ("created_at", "updated_at", "updated_at"),
    }
}
