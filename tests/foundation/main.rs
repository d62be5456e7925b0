//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Document, Decimal128, ordering, hashing,
//! coercion, and errors.

mod errors;
mod ordering;
mod values;
