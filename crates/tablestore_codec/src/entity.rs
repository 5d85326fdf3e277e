//! The store's native entity representation.

use crate::value::EdmValue;
use std::collections::BTreeMap;

/// Column name to value mapping of a native entity.
///
/// A key mapped to `None` is a column stored with an explicit null; a key
/// that is not in the map is an absent column. Decoding treats both the same
/// way, but they stay distinguishable here.
pub type PropertyMap = BTreeMap<String, Option<EdmValue>>;

/// Name of the partition key system property.
pub const PARTITION_KEY: &str = "PartitionKey";

/// Name of the row key system property.
pub const ROW_KEY: &str = "RowKey";

/// Maximum size of a single string or binary column in bytes.
///
/// Surfaced for callers; oversized payloads are not rejected before they
/// reach the store.
pub const MAX_STRING_COLUMN_BYTES: usize = 64 * 1024;

/// Maximum size of a whole entity in bytes.
pub const MAX_ENTITY_BYTES: usize = 1024 * 1024;

/// An entity as the store sees it: two keys plus sparse typed columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeEntity {
    /// The partition key.
    pub partition_key: String,
    /// The row key.
    pub row_key: String,
    /// The entity's columns.
    pub properties: PropertyMap,
}

impl NativeEntity {
    /// Creates an entity with no columns.
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Creates an entity with the given columns.
    pub fn with_properties(
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
        properties: PropertyMap,
    ) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties,
        }
    }

    /// Sets a column, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<EdmValue>) {
        self.properties.insert(column.into(), Some(value.into()));
    }

    /// Sets a column to an explicit null.
    pub fn insert_null(&mut self, column: impl Into<String>) {
        self.properties.insert(column.into(), None);
    }

    /// Gets a column's value.
    ///
    /// Returns `None` both for absent columns and for stored nulls.
    pub fn get(&self, column: &str) -> Option<&EdmValue> {
        self.properties.get(column).and_then(Option::as_ref)
    }

    /// Returns true if the column exists, even with a null value.
    pub fn contains_column(&self, column: &str) -> bool {
        self.properties.contains_key(column)
    }

    /// Returns the approximate serialized size of the entity.
    pub fn approximate_size(&self) -> usize {
        let keys = utf16_bytes(&self.partition_key) + utf16_bytes(&self.row_key);
        let columns: usize = self
            .properties
            .iter()
            .map(|(name, value)| {
                utf16_bytes(name) + value.as_ref().map_or(0, EdmValue::approximate_size)
            })
            .sum();
        keys + columns
    }
}

fn utf16_bytes(text: &str) -> usize {
    text.encode_utf16().count() * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_absent_are_distinct() {
        let mut entity = NativeEntity::new("p", "r");
        entity.insert_null("Nothing");

        assert!(entity.contains_column("Nothing"));
        assert!(!entity.contains_column("Missing"));
        assert_eq!(entity.get("Nothing"), None);
        assert_eq!(entity.get("Missing"), None);
    }

    #[test]
    fn size_counts_utf16_units() {
        // "é" is 2 UTF-8 bytes but one UTF-16 unit.
        let mut entity = NativeEntity::new("é", "r");
        entity.insert("Näme", "ü");
        assert_eq!(entity.approximate_size(), 2 + 2 + 8 + 2);
    }
}
