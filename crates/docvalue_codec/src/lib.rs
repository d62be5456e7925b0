//! Codecs for document values.
//!
//! This crate provides:
//! - [`element`] - Conversion to and from `bson` documents through the
//!   [`ElementBuilder`](docvalue_foundation::ElementBuilder) callbacks
//! - [`spill`] - Compact byte encoding for external-sort spill files
//! - [`SpillConfig`] - Limits applied while decoding spill streams

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod element;
mod partial;
pub mod spill;

pub use config::SpillConfig;
pub use element::{
    BsonBuilder, document_from_bson, document_to_bson, value_from_bson, value_to_bson, wrap,
};
pub use spill::{SorterSerializable, SpillReader, SpillWriter};
