//! Record to entity mapping.

use crate::columns::{ColumnReader, ColumnWriter};
use crate::entity::{NativeEntity, PropertyMap};
use crate::error::CodecResult;

/// Trait for record types that can be stored as table entities.
///
/// Implementors list their mapped fields once for each direction:
/// - `write_columns()`: every readable field, native or JSON
/// - `read_columns()`: every writable field, native or JSON
///
/// A field written but never read behaves like a property with a getter
/// and no setter; the reverse behaves like a setter-only property. Most
/// records use the [`table_entity!`](crate::table_entity) macro, which
/// maps each listed field in both directions.
///
/// # Example
///
/// ```rust
/// use tablestore_codec::{ColumnReader, ColumnWriter, CodecResult, TableEntity};
///
/// #[derive(Default)]
/// struct Counter {
///     name: String,
///     hits: i64,
///     labels: Vec<String>,
/// }
///
/// impl TableEntity for Counter {
///     fn write_columns(&self, columns: &mut ColumnWriter) -> CodecResult<()> {
///         columns.native("Name", &self.name);
///         columns.native("Hits", &self.hits);
///         columns.json("Labels", &self.labels)
///     }
///
///     fn read_columns(&mut self, columns: &ColumnReader<'_>) -> CodecResult<()> {
///         columns.native("Name", &mut self.name);
///         columns.native("Hits", &mut self.hits);
///         columns.json("Labels", &mut self.labels)
///     }
/// }
/// ```
pub trait TableEntity: Default {
    /// Writes the record's readable fields.
    fn write_columns(&self, columns: &mut ColumnWriter) -> CodecResult<()>;

    /// Populates the record's writable fields from stored columns.
    ///
    /// Called on a default-initialized record; fields whose columns are
    /// missing keep their default.
    fn read_columns(&mut self, columns: &ColumnReader<'_>) -> CodecResult<()>;
}

/// Converts between typed records and native entities.
pub struct EntityCodec;

impl EntityCodec {
    /// Encodes a record into its columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON fallback field cannot be serialized.
    pub fn encode<T: TableEntity>(record: &T) -> CodecResult<PropertyMap> {
        let mut writer = ColumnWriter::new();
        record.write_columns(&mut writer)?;
        Ok(writer.into_properties())
    }

    /// Encodes a record into an entity with the given keys.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON fallback field cannot be serialized.
    pub fn to_entity<T: TableEntity>(
        record: &T,
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
    ) -> CodecResult<NativeEntity> {
        Ok(NativeEntity::with_properties(
            partition_key,
            row_key,
            Self::encode(record)?,
        ))
    }

    /// Decodes an entity into a new record.
    ///
    /// Columns that no field reads are ignored, so several record types
    /// can share one table.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON fallback column is corrupt.
    pub fn decode<T: TableEntity>(entity: &NativeEntity) -> CodecResult<T> {
        Self::decode_properties(&entity.properties)
    }

    /// Decodes a bare column map into a new record.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON fallback column is corrupt.
    pub fn decode_properties<T: TableEntity>(properties: &PropertyMap) -> CodecResult<T> {
        let mut record = T::default();
        record.read_columns(&ColumnReader::new(properties))?;
        Ok(record)
    }
}
