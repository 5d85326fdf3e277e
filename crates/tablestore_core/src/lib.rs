//! # tablestore core
//!
//! Typed and untyped stores over a partitioned wide-column table.
//!
//! This crate provides:
//! - [`keys`]: key sanitization and validation
//! - [`UntypedStore`]: CRUD and single-partition batches on native entities
//! - [`TypedStore`]: the same operations on records, with key selectors
//! - [`batch`]: multi-partition writes as sequential partition batches
//! - [`filter`]: OData key filters
//!
//! Data flows from a [`TypedStore`] through [`tablestore_codec::EntityCodec`]
//! into an [`UntypedStore`], which sanitizes keys and drives a
//! [`tablestore_client::TableClient`].
//!
//! ## Logging
//!
//! Operations emit `tracing` events (`debug` per request, `info` on table
//! creation, `warn` on conflicts and aborted batches). No subscriber is
//! installed here.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
mod config;
mod error;
pub mod filter;
pub mod keys;
mod selector;
mod typed;
mod untyped;

pub use batch::{BatchState, BatchSummary, PartitionBatches, PartitionGroup};
pub use config::StoreConfig;
pub use error::{CoreError, CoreResult};
pub use keys::KeyValidationFailure;
pub use selector::{KeySelector, KeySelectors};
pub use typed::{RecordStream, TypedStore};
pub use untyped::{list_all_tables, list_tables, EntityStream, UntypedStore};

pub use tablestore_client::Credentials;
pub use tablestore_codec::{table_entity, NativeEntity, TableEntity};
