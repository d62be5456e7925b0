//! Error types for document values.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every [`ErrorKind`] maps to a stable numeric code so callers can translate
//! failures into their own request-level errors.

use std::fmt;

use thiserror::Error;

use crate::types::TypeTag;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for document value operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the stable code of this error's kind.
    #[must_use]
    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    /// Creates an error for a value of the wrong type for a coercion.
    #[must_use]
    pub fn cannot_coerce(from: TypeTag, target: CoercionTarget) -> Self {
        Self::new(ErrorKind::CannotCoerce { from, target })
    }

    /// Creates a nesting depth overflow error.
    #[must_use]
    pub fn depth_exceeded(limit: usize) -> Self {
        tracing::debug!(limit, "rejecting value nested beyond the depth limit");
        Self::new(ErrorKind::DepthExceeded { limit })
    }

    /// Creates a truncated spill stream error.
    #[must_use]
    pub fn spill_truncated(needed: usize, remaining: usize) -> Self {
        Self::new(ErrorKind::SpillTruncated { needed, remaining })
    }
}

/// Target kind of a failed coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionTarget {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// Binary floating point.
    Double,
    /// 128-bit decimal.
    Decimal,
    /// UTC date.
    Date,
    /// Text.
    String,
    /// Internal timestamp.
    Timestamp,
}

impl CoercionTarget {
    const fn code(self) -> u32 {
        match self {
            Self::Int => 16003,
            Self::Long => 16004,
            Self::Double => 16005,
            Self::Date => 16006,
            Self::String => 16007,
            Self::Decimal => 16008,
            Self::Timestamp => 16378,
        }
    }
}

impl fmt::Display for CoercionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Date => "Date",
            Self::String => "String",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Numeric value does not fit in a 32-bit integer.
    #[error("Can't coerce out of range value {0} to int")]
    IntOutOfRange(String),

    /// Numeric value does not fit in a 64-bit integer.
    #[error("Can't coerce out of range value {0} to long")]
    LongOutOfRange(String),

    /// The value's type has no conversion to the requested kind.
    #[error("can't convert from BSON type {from} to {target}")]
    CannotCoerce {
        /// The type of the value being coerced.
        from: TypeTag,
        /// The requested kind.
        target: CoercionTarget,
    },

    /// Date cannot be rendered in the ISO-8601 format.
    #[error("failed while coercing date to string: {millis}ms is outside the formattable range")]
    DateFormat {
        /// Milliseconds since the Unix epoch.
        millis: i64,
    },

    /// A composite value is nested beyond the allowed depth.
    #[error("cannot convert document to BSON because it exceeds the limit of {limit} levels of nesting")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// Text could not be parsed as a decimal128 number.
    #[error("invalid decimal128 literal: {0:?}")]
    InvalidDecimal(String),

    /// A terminator-delimited payload contains a NUL byte.
    #[error("{what} must not contain NUL bytes")]
    InteriorNul {
        /// What was being stored (regex pattern, field name, ...).
        what: &'static str,
    },

    /// Spill stream ended before a complete value was read.
    #[error("spill stream truncated: needed {needed} bytes, {remaining} remaining")]
    SpillTruncated {
        /// Bytes required by the next read.
        needed: usize,
        /// Bytes left in the stream.
        remaining: usize,
    },

    /// Spill stream contains a tag byte that names no value kind.
    #[error("unknown type tag {0} in spill stream")]
    SpillUnknownTag(i8),

    /// Spill stream carries a negative or oversized length prefix.
    #[error("invalid length {length} in spill stream (limit {limit})")]
    SpillBadLength {
        /// The decoded length prefix.
        length: i64,
        /// The configured payload limit.
        limit: usize,
    },

    /// Spill stream carries text that is not UTF-8.
    #[error("invalid UTF-8 in spill stream")]
    SpillInvalidUtf8,

    /// Spill stream ended inside a terminator-delimited run.
    #[error("unterminated string in spill stream")]
    SpillMissingTerminator,

    /// Failure reported by the document-model collaborator.
    #[error("document model error: {0}")]
    Document(String),
}

impl ErrorKind {
    /// Returns the stable numeric code for this kind.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::IntOutOfRange(_) => 31108,
            Self::LongOutOfRange(_) => 31109,
            Self::CannotCoerce { target, .. } => target.code(),
            Self::DateFormat { .. } => 18537,
            Self::DepthExceeded { .. } => 15,
            Self::InvalidDecimal(_) => 9,
            Self::InteriorNul { .. } => 16411,
            Self::SpillTruncated { .. }
            | Self::SpillUnknownTag(_)
            | Self::SpillBadLength { .. }
            | Self::SpillInvalidUtf8
            | Self::SpillMissingTerminator => 17261,
            Self::Document(_) => 22,
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Dotted path of the field being processed.
    pub path: Option<String>,
    /// Byte offset in a spill stream.
    pub offset: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the stream offset.
    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "at {path}")?;
        }
        if let Some(offset) = self.offset {
            if self.path.is_some() {
                write!(f, " ")?;
            }
            write!(f, "(offset {offset})")?;
        }
        Ok(())
    }
}
