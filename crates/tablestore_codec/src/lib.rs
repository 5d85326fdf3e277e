//! # tablestore codec
//!
//! Mapping between typed Rust records and the native entity representation
//! of a partitioned wide-column table store.
//!
//! A native entity is a partition key, a row key and a sparse set of typed
//! columns. This crate provides:
//! - [`EdmValue`]: the closed set of native column kinds
//! - [`NativeEntity`] / [`PropertyMap`]: the untyped entity
//! - [`TableEntity`]: the per-record mapping, usually via [`table_entity!`]
//! - [`EntityCodec`]: encode and decode entry points
//!
//! ## Column naming
//!
//! - Native fields use their column name verbatim
//! - Non-native fields are stored as JSON text under `__jsonFor_<column>`
//!
//! ## Usage
//!
//! ```
//! use tablestore_codec::{table_entity, EdmValue, EntityCodec};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Plate {
//!     number: String,
//!     issued: i32,
//! }
//!
//! table_entity!(Plate {
//!     native number => "Number",
//!     native issued => "Issued",
//! });
//!
//! let plate = Plate { number: "ABC123".into(), issued: 2019 };
//! let entity = EntityCodec::to_entity(&plate, "Westview", "ABC123").unwrap();
//! assert_eq!(entity.get("Issued"), Some(&EdmValue::Int32(2019)));
//!
//! let decoded: Plate = EntityCodec::decode(&entity).unwrap();
//! assert_eq!(decoded, plate);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod columns;
mod entity;
mod error;
mod macros;
mod value;

pub use codec::{EntityCodec, TableEntity};
pub use columns::{json_column_name, ColumnReader, ColumnWriter, JSON_COLUMN_PREFIX};
pub use entity::{
    NativeEntity, PropertyMap, MAX_ENTITY_BYTES, MAX_STRING_COLUMN_BYTES, PARTITION_KEY, ROW_KEY,
};
pub use error::{CodecError, CodecResult};
pub use value::{EdmKind, EdmValue, NativeProperty};
