//! Field-level column access used by [`crate::TableEntity`] implementations.

use crate::entity::PropertyMap;
use crate::error::{CodecError, CodecResult};
use crate::value::{EdmValue, NativeProperty};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Prefix of the column that holds a non-native field as JSON text.
pub const JSON_COLUMN_PREFIX: &str = "__jsonFor_";

/// Returns the column name under which a non-native field is persisted.
pub fn json_column_name(field: &str) -> String {
    format!("{JSON_COLUMN_PREFIX}{field}")
}

/// Collects the columns of a record being encoded.
#[derive(Debug, Default)]
pub struct ColumnWriter {
    properties: PropertyMap,
}

impl ColumnWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a native field verbatim under `column`.
    pub fn native<V: NativeProperty>(&mut self, column: &str, value: &V) {
        self.properties.insert(column.to_string(), value.to_edm());
    }

    /// Writes a non-native field as JSON under `__jsonFor_<column>`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if the value cannot be
    /// serialized.
    pub fn json<V: Serialize + ?Sized>(&mut self, column: &str, value: &V) -> CodecResult<()> {
        let text = serde_json::to_string(value)
            .map_err(|e| CodecError::encoding_failed(column, e.to_string()))?;
        self.properties
            .insert(json_column_name(column), Some(EdmValue::String(text)));
        Ok(())
    }

    /// Consumes the writer and returns the collected columns.
    pub fn into_properties(self) -> PropertyMap {
        self.properties
    }
}

/// Read access to the columns of an entity being decoded.
#[derive(Debug, Clone, Copy)]
pub struct ColumnReader<'a> {
    properties: &'a PropertyMap,
}

impl<'a> ColumnReader<'a> {
    /// Creates a reader over `properties`.
    pub fn new(properties: &'a PropertyMap) -> Self {
        Self { properties }
    }

    /// Reads a native field.
    ///
    /// The target is left untouched when the column is absent, null, or of
    /// a kind that is not assignable to `V`.
    pub fn native<V: NativeProperty>(&self, column: &str, target: &mut V) {
        if let Some(value) = self.raw(column) {
            if let Some(decoded) = V::from_edm(value) {
                *target = decoded;
            }
        }
    }

    /// Reads a non-native field from its `__jsonFor_<column>` column.
    ///
    /// The target is left untouched when the column is absent or null.
    ///
    /// # Errors
    ///
    /// - [`CodecError::CorruptJsonColumn`] if the column holds a non-string
    /// - [`CodecError::Json`] if the text is not valid JSON for `V`
    pub fn json<V: DeserializeOwned>(&self, column: &str, target: &mut V) -> CodecResult<()> {
        let name = json_column_name(column);
        match self.raw(&name) {
            None => Ok(()),
            Some(EdmValue::String(text)) => {
                *target = serde_json::from_str(text)
                    .map_err(|e| CodecError::json(name.as_str(), e.to_string()))?;
                Ok(())
            }
            Some(other) => Err(CodecError::corrupt_json_column(name, other.kind().as_str())),
        }
    }

    /// Returns a column's value, flattening absent and null to `None`.
    pub fn raw(&self, column: &str) -> Option<&'a EdmValue> {
        self.properties.get(column).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_column_uses_prefix() {
        let mut writer = ColumnWriter::new();
        writer.json("Tags", &vec!["a", "b"]).unwrap();
        let props = writer.into_properties();

        assert!(!props.contains_key("Tags"));
        assert_eq!(
            props.get("__jsonFor_Tags"),
            Some(&Some(EdmValue::String(r#"["a","b"]"#.into())))
        );
    }

    #[test]
    fn missing_native_leaves_default() {
        let props = PropertyMap::new();
        let reader = ColumnReader::new(&props);
        let mut value = 42i32;
        reader.native("Count", &mut value);
        assert_eq!(value, 42);
    }

    #[test]
    fn unassignable_native_is_skipped() {
        let mut props = PropertyMap::new();
        props.insert("Count".into(), Some(EdmValue::String("nine".into())));
        let reader = ColumnReader::new(&props);
        let mut value = 1i32;
        reader.native("Count", &mut value);
        assert_eq!(value, 1);
    }

    #[test]
    fn null_json_leaves_default() {
        let mut props = PropertyMap::new();
        props.insert("__jsonFor_Tags".into(), None);
        let reader = ColumnReader::new(&props);
        let mut tags = vec!["keep".to_string()];
        reader.json("Tags", &mut tags).unwrap();
        assert_eq!(tags, vec!["keep".to_string()]);
    }

    #[test]
    fn non_string_json_is_corruption() {
        let mut props = PropertyMap::new();
        props.insert("__jsonFor_Tags".into(), Some(EdmValue::Int32(5)));
        let reader = ColumnReader::new(&props);
        let mut tags: Vec<String> = Vec::new();
        let err = reader.json("Tags", &mut tags).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn malformed_json_is_reported() {
        let mut props = PropertyMap::new();
        props.insert("__jsonFor_Map".into(), Some(EdmValue::from("{not json")));
        let reader = ColumnReader::new(&props);
        let mut map: BTreeMap<String, i32> = BTreeMap::new();
        let err = reader.json("Map", &mut map).unwrap_err();
        assert!(matches!(err, CodecError::Json { .. }));
    }
}
