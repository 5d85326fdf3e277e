//! # tablestore client
//!
//! The boundary between tablestore and the backing table service.
//!
//! The store layer never talks to the network itself. It drives a
//! [`TableClient`] obtained from a [`TableService`], and everything behind
//! those traits (transport, authentication, retries) belongs to the
//! implementation.
//!
//! ## Available Implementations
//!
//! - [`InMemoryTableService`] / [`InMemoryTableClient`]: a faithful
//!   in-process table for tests and demos, with fault injection and request
//!   recording
//!
//! ## Design Principles
//!
//! - One method per store request; paging is explicit via
//!   [`ContinuationToken`]
//! - Batches are restricted to one partition and applied all or nothing
//! - Errors carry the store's status code and reason unchanged

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod credentials;
mod error;
mod filter;
mod memory;

pub use client::{
    BatchOperation, ContinuationToken, QueryPage, TableClient, TableDescriptor, TableService,
};
pub use credentials::Credentials;
pub use error::{
    ClientError, ClientResult, STATUS_BAD_REQUEST, STATUS_CONFLICT, STATUS_NOT_FOUND,
};
pub use memory::{
    FaultTarget, InMemoryConfig, InMemoryTableClient, InMemoryTableService, RecordedCall,
    DEFAULT_PAGE_SIZE, MAX_BATCH_OPERATIONS,
};
