//! # tablestore testkit
//!
//! Test utilities for tablestore.
//!
//! This crate provides:
//! - Fixture records mapped with `table_entity!`
//! - In-memory service helpers
//! - Property-based key generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use tablestore_testkit::prelude::*;
//!
//! let car = Vehicle::sample("ABC123", "Westview");
//! assert_eq!(car.city, "Westview");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
