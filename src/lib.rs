//! Docvalue - Immutable document values for a document database
//!
//! This crate re-exports all layers of the docvalue workspace for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: docvalue_codec      - BSON element conversion, spill codec
//! Layer 0: docvalue_foundation - Value, ordering, hashing, coercion
//! ```

pub use docvalue_codec as codec;
pub use docvalue_foundation as foundation;

pub use docvalue_foundation::{Document, Error, ErrorKind, Result, Value, ValueComparator};
