//! Compile-time limits shared by every layer.

/// Maximum nesting depth of composite values.
///
/// A document or array counts as one level; scalars add nothing. Every
/// container constructor, the canonical emitter, and the spill decoder
/// enforce this bound, which also bounds the recursion performed when the
/// last handle to a deeply nested value is dropped.
pub const MAX_DEPTH: usize = 200;

/// Largest string or binary payload stored inline in a [`ByteCell`].
///
/// [`ByteCell`]: crate::cell::ByteCell
pub const INLINE_CAPACITY: usize = 14;

/// Upper bound on a single BSON document, used as the default payload limit
/// when decoding spill streams.
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;
