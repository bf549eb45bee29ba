//! Schema model and runtime type resolution.
//!
//! The compiler consumes exactly one external capability: "given a table
//! name, return its column names and native type strings". [`SchemaProvider`]
//! is that capability. [`TypeResolver`] normalizes the answer into type
//! categories and caches it for the lifetime of the process.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SiftError;

/// Normalized column type categories. Operator semantics in the compiler
/// depend on these, not on native type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Uuid,
    Timestamp,
    Numeric,
    Integer,
    Text,
    TsVector,
    Other,
}

impl ColumnType {
    /// Substring heuristics over a native type name, e.g. `timestamptz` and
    /// `date` both land on `Timestamp`, `int4`/`bigserial` on `Integer`.
    pub fn from_native(native: &str) -> Self {
        let t = native.to_ascii_lowercase();
        if t.contains("bool") {
            ColumnType::Boolean
        } else if t.contains("uuid") {
            ColumnType::Uuid
        } else if t.contains("timestamp") || t == "date" {
            ColumnType::Timestamp
        } else if t.contains("tsvector") {
            ColumnType::TsVector
        } else if t.contains("int") || t.contains("serial") {
            ColumnType::Integer
        } else if t.contains("numeric")
            || t.contains("decimal")
            || t.contains("real")
            || t.contains("double")
            || t.contains("money")
        {
            ColumnType::Numeric
        } else if t.contains("text")
            || t.contains("char")
            || t.contains("json")
            || t.contains("enum")
            || t.contains("bytea")
        {
            ColumnType::Text
        } else {
            ColumnType::Other
        }
    }

    /// Whether `>` / `<` comparisons push down for this category.
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Numeric | ColumnType::Timestamp
        )
    }
}

/// Column name → normalized type category for one table.
pub type ColumnTypes = HashMap<String, ColumnType>;

/// The single external introspection capability.
pub trait SchemaProvider: Send + Sync {
    /// `(column name, native type)` pairs for a table. An unknown table is
    /// an empty list, not an error.
    fn columns(&self, table: &str) -> Result<Vec<(String, String)>, SiftError>;
}

/// Static schema definition, loadable from JSON.
///
/// ```
/// use sift::schema::Schema;
///
/// let json = r#"{
///     "tables": [{
///         "name": "items",
///         "columns": [
///             { "name": "id", "type": "uuid" },
///             { "name": "name", "type": "varchar" }
///         ]
///     }]
/// }"#;
///
/// let schema = Schema::from_json(json).unwrap();
/// assert_eq!(schema.tables.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<TableDef>,
}

/// Table definition with columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// Column definition with its native type name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type", alias = "typ")]
    pub typ: String,
    #[serde(default)]
    pub nullable: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn add_table(&mut self, table: TableDef) {
        self.tables.push(table);
    }

    /// Load schema from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load schema from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, SiftError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| SiftError::Config(format!("{}: {}", path.display(), e)))
    }
}

impl TableDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    /// Builder: add a column.
    pub fn column(mut self, name: &str, typ: &str) -> Self {
        self.columns.push(ColumnDef {
            name: name.to_string(),
            typ: typ.to_string(),
            nullable: true,
        });
        self
    }
}

impl SchemaProvider for Schema {
    fn columns(&self, table: &str) -> Result<Vec<(String, String)>, SiftError> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| {
                t.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.typ.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Resolves and caches normalized column types per table.
///
/// Entries are never invalidated: the schema is assumed stable for the life
/// of the process. Concurrent population of the same key is harmless — the
/// computed value is deterministic, so racing writers converge.
pub struct TypeResolver {
    provider: Arc<dyn SchemaProvider>,
    cache: RwLock<HashMap<String, Arc<ColumnTypes>>>,
}

impl TypeResolver {
    pub fn new(provider: Arc<dyn SchemaProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Column type map for a table.
    ///
    /// Never errors: introspection failure yields an empty map, which makes
    /// every filter key for the table unconvertible downstream and forces
    /// the in-process fallback.
    pub fn resolve(&self, table: &str) -> Arc<ColumnTypes> {
        if let Ok(cache) = self.cache.read() {
            if let Some(types) = cache.get(table) {
                return Arc::clone(types);
            }
        }

        let types: ColumnTypes = match self.provider.columns(table) {
            Ok(cols) => cols
                .into_iter()
                .map(|(name, native)| (name, ColumnType::from_native(&native)))
                .collect(),
            Err(e) => {
                warn!(table, error = %e, "schema introspection failed; treating table as unknown");
                HashMap::new()
            }
        };

        let types = Arc::new(types);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(table.to_string(), Arc::clone(&types));
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_native_type_normalization() {
        assert_eq!(ColumnType::from_native("boolean"), ColumnType::Boolean);
        assert_eq!(ColumnType::from_native("bool"), ColumnType::Boolean);
        assert_eq!(ColumnType::from_native("uuid"), ColumnType::Uuid);
        assert_eq!(ColumnType::from_native("timestamptz"), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_native("date"), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_native("int4"), ColumnType::Integer);
        assert_eq!(ColumnType::from_native("bigserial"), ColumnType::Integer);
        assert_eq!(ColumnType::from_native("numeric"), ColumnType::Numeric);
        assert_eq!(ColumnType::from_native("double precision"), ColumnType::Numeric);
        assert_eq!(ColumnType::from_native("character varying"), ColumnType::Text);
        assert_eq!(ColumnType::from_native("jsonb"), ColumnType::Text);
        assert_eq!(ColumnType::from_native("tsvector"), ColumnType::TsVector);
        assert_eq!(ColumnType::from_native("point"), ColumnType::Other);
    }

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl SchemaProvider for CountingProvider {
        fn columns(&self, _table: &str) -> Result<Vec<(String, String)>, SiftError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SiftError::Introspection("boom".to_string()));
            }
            Ok(vec![("id".to_string(), "uuid".to_string())])
        }
    }

    #[test]
    fn test_resolver_caches_per_table() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let resolver = TypeResolver::new(provider.clone());

        let first = resolver.resolve("items");
        let second = resolver.resolve("items");
        assert_eq!(first.get("id"), Some(&ColumnType::Uuid));
        assert_eq!(second.get("id"), Some(&ColumnType::Uuid));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_introspection_failure_yields_empty_map() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let resolver = TypeResolver::new(provider);
        assert!(resolver.resolve("items").is_empty());
    }

    #[test]
    fn test_schema_provider_unknown_table_is_empty() {
        let schema = Schema::new();
        assert!(schema.columns("nothing").unwrap().is_empty());
    }
}
