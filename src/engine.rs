//! Live schema loading and SQL rendering.
//!
//! The rest of the crate never talks to a database. This module adapts the
//! compiled output to sqlx/Postgres: it loads schema metadata from
//! `information_schema` once at startup, renders a [`CompiledConditional`]
//! into a full SELECT, and binds literals in placeholder order.

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row as _;

use crate::ast::Literal;
use crate::compiler::CompiledConditional;
use crate::error::SiftError;
use crate::schema::{ColumnDef, Schema, TableDef};

/// Connect a small pool.
pub async fn connect(url: &str) -> Result<PgPool, SiftError> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .map_err(|e| SiftError::Connection(e.to_string()))
}

/// Load every public-schema column into a static [`Schema`].
///
/// This is the introspection capability done eagerly: one query at startup,
/// synchronous lookups from then on.
pub async fn load_schema(pool: &PgPool) -> Result<Schema, SiftError> {
    let rows = sqlx::query(
        "SELECT table_name, column_name, udt_name, is_nullable \
         FROM information_schema.columns \
         WHERE table_schema = 'public' \
         ORDER BY table_name, ordinal_position",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| SiftError::Introspection(e.to_string()))?;

    let mut schema = Schema::new();
    for row in rows {
        let table: String = get(&row, "table_name")?;
        let name: String = get(&row, "column_name")?;
        let typ: String = get(&row, "udt_name")?;
        let nullable: String = get(&row, "is_nullable")?;

        let def = ColumnDef {
            name,
            typ,
            nullable: nullable == "YES",
        };
        match schema.tables.iter_mut().find(|t| t.name == table) {
            Some(t) => t.columns.push(def),
            None => {
                let mut t = TableDef::new(&table);
                t.columns.push(def);
                schema.tables.push(t);
            }
        }
    }
    Ok(schema)
}

fn get(row: &PgRow, column: &str) -> Result<String, SiftError> {
    row.try_get(column)
        .map_err(|e| SiftError::Introspection(e.to_string()))
}

/// Render a full SELECT for a compiled conditional.
///
/// Named parameters map to Postgres `$n` placeholders; the returned values
/// are in `$n` order. This is the whole consumption contract: fragments
/// joined with AND, ordering joined with commas, LIMIT/OFFSET only when
/// present, values only ever bound.
pub fn render_select(compiled: &CompiledConditional) -> (String, Vec<Literal>) {
    let mut sql = format!(
        "SELECT {a}.* FROM {t} {a}",
        t = compiled.table,
        a = compiled.table_alias
    );

    if !compiled.where_fragments.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&compiled.where_fragments.join(" AND "));
    }
    if !compiled.order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&compiled.order_by.join(", "));
    }
    if let Some(limit) = compiled.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = compiled.offset {
        sql.push_str(&format!(" OFFSET {}", offset));
    }

    let values: Vec<Literal> = compiled
        .bound_params
        .iter()
        .map(|(_, v)| v.clone())
        .collect();

    // Highest index first so `:p1` never clobbers the tail of `:p10`.
    for (i, (name, _)) in compiled.bound_params.iter().enumerate().rev() {
        sql = sql.replace(&format!(":{}", name), &format!("${}", i + 1));
    }

    (sql, values)
}

/// Execute a rendered select, binding literals in order.
pub async fn fetch_rows(
    pool: &PgPool,
    compiled: &CompiledConditional,
) -> Result<Vec<PgRow>, SiftError> {
    let (sql, values) = render_select(compiled);
    let mut query = sqlx::query(&sql);
    for value in values {
        query = match value {
            Literal::Null => query.bind(Option::<String>::None),
            Literal::Bool(b) => query.bind(b),
            Literal::Int(i) => query.bind(i),
            Literal::Float(f) => query.bind(f),
            Literal::Str(s) => query.bind(s),
        };
    }
    query
        .fetch_all(pool)
        .await
        .map_err(|e| SiftError::Execution(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compiler::compile;
    use crate::parser::parse;
    use crate::schema::{TableDef, TypeResolver};

    fn resolver() -> TypeResolver {
        let schema = Schema {
            tables: vec![TableDef::new("items")
                .column("name", "text")
                .column("quantity", "int4")
                .column("updated_at", "timestamptz")],
        };
        TypeResolver::new(Arc::new(schema))
    }

    #[test]
    fn test_render_plain_query() {
        let c = compile(&parse("lamp"), "items", Some("i"), 25, &resolver());
        let (sql, values) = render_select(&c);
        assert_eq!(
            sql,
            "SELECT i.* FROM items i ORDER BY i.updated_at DESC LIMIT 25"
        );
        assert!(values.is_empty());
    }

    #[test]
    fn test_render_maps_named_params_to_positional() {
        let c = compile(
            &parse("?name=hammer ?quantity>3"),
            "items",
            Some("i"),
            25,
            &resolver(),
        );
        let (sql, values) = render_select(&c);
        assert_eq!(
            sql,
            "SELECT i.* FROM items i WHERE (i.name = $1 AND i.quantity > $2) \
             ORDER BY i.updated_at DESC LIMIT 25"
        );
        assert_eq!(
            values,
            vec![
                Literal::Str("hammer".to_string()),
                Literal::Int(3),
            ]
        );
    }

    #[test]
    fn test_render_includes_offset_only_when_present() {
        let c = compile(&parse(r"\show=10 \page=3"), "items", Some("i"), 25, &resolver());
        let (sql, _) = render_select(&c);
        assert!(sql.ends_with("LIMIT 10 OFFSET 20"));
    }
}
