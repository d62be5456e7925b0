//! Core document value type for the docvalue workspace.
//!
//! This crate provides:
//! - [`Value`] - The immutable, cheaply clonable document value
//! - [`Document`] and [`Array`] - Shared composite payloads
//! - [`Decimal128`] - IEEE 754-2008 decimal128 numbers (BID encoding)
//! - [`TypeTag`] - Closed set of value kinds and their canonical ordering
//! - [`ValueComparator`] - Total ordering and consistent hashing
//! - [`ElementBuilder`] - Builder callbacks for canonical emission
//! - [`Error`] - Reportable errors with stable codes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cell;
pub mod coerce;
pub mod collator;
pub mod compare;
pub mod decimal;
pub mod document;
pub mod emit;
pub mod error;
pub mod hash;
pub mod limits;
pub mod scalar;
pub mod types;
pub mod value;

pub use cell::{BinData, ByteCell, RegexCell, StrCell};
pub use collator::{SimpleStringComparator, StringComparator};
pub use compare::ValueComparator;
pub use decimal::Decimal128;
pub use document::{Array, CodeWithScope, DbRef, Document};
pub use emit::ElementBuilder;
pub use error::{CoercionTarget, Error, ErrorContext, ErrorKind, Result};
pub use limits::{INLINE_CAPACITY, MAX_DEPTH};
pub use scalar::{Date, ObjectId, Timestamp};
pub use types::TypeTag;
pub use value::Value;
