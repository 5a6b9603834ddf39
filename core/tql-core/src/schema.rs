//! Schema Registry — ordered attribute lists per table.
//!
//! A table's attribute order is fixed for its lifetime and defines tuple
//! positions: attribute `i` lives at tuple position `i + 1` (position 0 is the
//! table tag). Schemas are immutable once registered and shared as
//! `Arc<TableSchema>`, so concurrent transactions read them without locking.

use crate::error::{TqlError, TqlResult};
use ahash::AHashSet;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Storage kind declared for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// One record per key, unspecified order
    Set,
    /// One record per key, key order
    OrderedSet,
    /// Several records per key
    Bag,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Set => "set",
            TableKind::OrderedSet => "ordered_set",
            TableKind::Bag => "bag",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table metadata: name, ordered attributes and storage kind.
///
/// Deserialisation goes through [`TableSchema::new`], so a decoded schema is
/// validated like a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTableSchema")]
pub struct TableSchema {
    name: String,
    attributes: Vec<String>,
    kind: TableKind,
}

/// Unvalidated wire form of [`TableSchema`].
#[derive(Deserialize)]
struct RawTableSchema {
    name: String,
    attributes: Vec<String>,
    kind: TableKind,
}

impl TryFrom<RawTableSchema> for TableSchema {
    type Error = TqlError;

    fn try_from(raw: RawTableSchema) -> TqlResult<Self> {
        TableSchema::new(raw.name, raw.attributes, raw.kind)
    }
}

impl TableSchema {
    /// Build a schema, rejecting empty or duplicate attribute lists.
    pub fn new<I, S>(name: impl Into<String>, attributes: I, kind: TableKind) -> TqlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        if attributes.is_empty() {
            return Err(TqlError::Schema(format!(
                "table '{name}' must declare at least one attribute"
            )));
        }
        let mut seen = AHashSet::with_capacity(attributes.len());
        for attr in &attributes {
            if !seen.insert(attr.as_str()) {
                return Err(TqlError::Schema(format!(
                    "table '{name}' declares attribute '{attr}' twice"
                )));
            }
        }
        Ok(Self {
            name,
            attributes,
            kind,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Number of attributes, not counting the tag.
    pub fn arity(&self) -> usize {
        self.attributes.len()
    }

    /// The primary key attribute (first in schema order).
    pub fn key_attribute(&self) -> &str {
        self.attributes.first().map_or("", String::as_str)
    }

    /// Zero-based attribute index, `None` if undeclared.
    pub fn position(&self, attribute: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a == attribute)
    }

    /// Like [`position`](Self::position) but fails with `UnknownAttribute`.
    pub fn require_position(&self, attribute: &str) -> TqlResult<usize> {
        self.position(attribute)
            .ok_or_else(|| TqlError::UnknownAttribute {
                table: self.name.clone(),
                attribute: attribute.to_string(),
            })
    }
}

/// Concurrent, read-mostly table registry.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: DashMap<String, Arc<TableSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. Fails with `TableExists` if the name is taken.
    pub fn register(&self, schema: TableSchema) -> TqlResult<Arc<TableSchema>> {
        use dashmap::mapref::entry::Entry;
        match self.tables.entry(schema.name.clone()) {
            Entry::Occupied(_) => Err(TqlError::TableExists(schema.name)),
            Entry::Vacant(slot) => {
                let schema = Arc::new(schema);
                slot.insert(Arc::clone(&schema));
                Ok(schema)
            }
        }
    }

    /// Remove a table, returning its schema if it was registered.
    pub fn unregister(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.tables.remove(table).map(|(_, schema)| schema)
    }

    pub fn get(&self, table: &str) -> TqlResult<Arc<TableSchema>> {
        self.tables
            .get(table)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| TqlError::TableNotFound(table.to_string()))
    }

    pub fn get_attributes(&self, table: &str) -> TqlResult<Vec<String>> {
        Ok(self.get(table)?.attributes.clone())
    }

    pub fn get_arity(&self, table: &str) -> TqlResult<usize> {
        Ok(self.get(table)?.arity())
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> TableSchema {
        TableSchema::new("person", ["id", "name", "age"], TableKind::Set).unwrap()
    }

    #[test]
    fn positions_follow_declaration_order() {
        let schema = person();
        assert_eq!(schema.arity(), 3);
        assert_eq!(schema.key_attribute(), "id");
        assert_eq!(schema.position("age"), Some(2));
        assert_eq!(schema.position("email"), None);
    }

    #[test]
    fn rejects_duplicate_attributes() {
        let err = TableSchema::new("t", ["a", "a"], TableKind::Bag).unwrap_err();
        assert!(matches!(err, TqlError::Schema(_)));
    }

    #[test]
    fn rejects_empty_attribute_list() {
        let err = TableSchema::new("t", Vec::<String>::new(), TableKind::Set).unwrap_err();
        assert!(matches!(err, TqlError::Schema(_)));
    }

    #[test]
    fn registry_lookup() {
        let registry = SchemaRegistry::new();
        registry.register(person()).unwrap();

        assert_eq!(registry.get_arity("person").unwrap(), 3);
        assert_eq!(
            registry.get_attributes("person").unwrap(),
            vec!["id", "name", "age"]
        );
        assert!(matches!(
            registry.get("missing"),
            Err(TqlError::TableNotFound(_))
        ));
    }

    #[test]
    fn registry_rejects_duplicate_table() {
        let registry = SchemaRegistry::new();
        registry.register(person()).unwrap();
        assert!(matches!(
            registry.register(person()),
            Err(TqlError::TableExists(_))
        ));
        assert!(registry.unregister("person").is_some());
        assert!(!registry.contains("person"));
    }

    #[test]
    fn deserialize_validates_attributes() {
        let empty = r#"{"name":"t","attributes":[],"kind":"set"}"#;
        assert!(serde_json::from_str::<TableSchema>(empty).is_err());

        let dup = r#"{"name":"t","attributes":["a","a"],"kind":"bag"}"#;
        assert!(serde_json::from_str::<TableSchema>(dup).is_err());

        let json = serde_json::to_string(&person()).unwrap();
        let back: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, person());
        assert_eq!(back.key_attribute(), "id");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&TableKind::OrderedSet).unwrap();
        assert_eq!(json, "\"ordered_set\"");
    }
}
