//! Storage cells for byte-like payloads.
//!
//! Strings, symbols, code, binary data and regular expressions all share one
//! representation: payloads up to [`INLINE_CAPACITY`] bytes are copied into a
//! zeroed buffer embedded in the cell, larger ones live in a single
//! reference-counted heap block. Both layouts keep a terminator byte after
//! the payload, so C-string views never need a copy.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, ErrorKind, Result};
use crate::limits::INLINE_CAPACITY;

/// Inline-or-shared byte storage with an implicit trailing terminator.
#[derive(Clone)]
pub enum ByteCell {
    /// Payload copied into a buffer that was zeroed before the write.
    Inline {
        /// Payload length.
        len: u8,
        /// Payload bytes followed by at least one zero byte.
        bytes: [u8; INLINE_CAPACITY + 1],
    },
    /// Payload plus terminator in a shared heap block.
    Shared(Arc<[u8]>),
}

impl ByteCell {
    /// Stores a payload, inline when it fits.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(payload: &[u8]) -> Self {
        if payload.len() <= INLINE_CAPACITY {
            let mut bytes = [0u8; INLINE_CAPACITY + 1];
            bytes[..payload.len()].copy_from_slice(payload);
            Self::Inline {
                len: payload.len() as u8,
                bytes,
            }
        } else {
            let mut block = Vec::with_capacity(payload.len() + 1);
            block.extend_from_slice(payload);
            block.push(0);
            Self::Shared(block.into())
        }
    }

    /// Returns the payload without its terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Inline { len, bytes } => &bytes[..usize::from(*len)],
            Self::Shared(block) => &block[..block.len() - 1],
        }
    }

    /// Returns the payload followed by its terminator byte.
    #[must_use]
    pub fn as_bytes_with_terminator(&self) -> &[u8] {
        match self {
            Self::Inline { len, bytes } => &bytes[..=usize::from(*len)],
            Self::Shared(block) => block,
        }
    }

    /// Returns the payload length.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Inline { len, .. } => usize::from(*len),
            Self::Shared(block) => block.len() - 1,
        }
    }

    /// Returns true if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the payload lives in the embedded buffer.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    /// Heap bytes owned by this cell (zero when inline).
    #[must_use]
    pub fn heap_size(&self) -> usize {
        match self {
            Self::Inline { .. } => 0,
            Self::Shared(block) => block.len(),
        }
    }
}

impl fmt::Debug for ByteCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_bytes()).finish()
    }
}

/// A [`ByteCell`] known to hold UTF-8 text.
#[derive(Clone)]
pub struct StrCell(ByteCell);

impl StrCell {
    /// Stores a string.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self(ByteCell::new(text.as_bytes()))
    }

    /// Stores raw bytes after validating them as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::SpillInvalidUtf8`] if the bytes are not UTF-8.
    pub fn from_utf8(bytes: &[u8]) -> Result<Self> {
        std::str::from_utf8(bytes)
            .map(Self::new)
            .map_err(|_| Error::new(ErrorKind::SpillInvalidUtf8))
    }

    /// Returns the text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match std::str::from_utf8(self.0.as_bytes()) {
            Ok(text) => text,
            Err(_) => unreachable!("StrCell is only built from UTF-8"),
        }
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns the underlying cell.
    #[must_use]
    pub const fn cell(&self) -> &ByteCell {
        &self.0
    }
}

impl fmt::Debug for StrCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Regular expression stored as `pattern NUL flags` in a single cell.
#[derive(Clone)]
pub struct RegexCell {
    cell: ByteCell,
    pattern_len: usize,
}

impl RegexCell {
    /// Stores a pattern and its flags.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InteriorNul`] if either part contains a NUL byte,
    /// since NUL separates the two parts.
    pub fn new(pattern: &str, flags: &str) -> Result<Self> {
        if pattern.contains('\0') {
            return Err(Error::new(ErrorKind::InteriorNul {
                what: "regular expression pattern",
            }));
        }
        if flags.contains('\0') {
            return Err(Error::new(ErrorKind::InteriorNul {
                what: "regular expression flags",
            }));
        }
        let mut joined = Vec::with_capacity(pattern.len() + 1 + flags.len());
        joined.extend_from_slice(pattern.as_bytes());
        joined.push(0);
        joined.extend_from_slice(flags.as_bytes());
        Ok(Self {
            cell: ByteCell::new(&joined),
            pattern_len: pattern.len(),
        })
    }

    /// Returns the pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        utf8(&self.cell.as_bytes()[..self.pattern_len])
    }

    /// Returns the flags.
    #[must_use]
    pub fn flags(&self) -> &str {
        utf8(&self.cell.as_bytes()[self.pattern_len + 1..])
    }

    /// Returns `pattern NUL flags`, the form regexes compare and hash by.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        self.cell.as_bytes()
    }

    /// Returns the underlying cell.
    #[must_use]
    pub const fn cell(&self) -> &ByteCell {
        &self.cell
    }
}

impl fmt::Debug for RegexCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern(), self.flags())
    }
}

fn utf8(bytes: &[u8]) -> &str {
    match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => unreachable!("regex parts are only built from UTF-8"),
    }
}

/// Binary blob: a subtype byte plus payload bytes.
#[derive(Clone)]
pub struct BinData {
    subtype: u8,
    bytes: ByteCell,
}

impl BinData {
    /// Generic binary subtype.
    pub const GENERIC: u8 = 0x00;
    /// UUID subtype.
    pub const UUID: u8 = 0x04;

    /// Stores a binary payload.
    #[must_use]
    pub fn new(subtype: u8, bytes: &[u8]) -> Self {
        Self {
            subtype,
            bytes: ByteCell::new(bytes),
        }
    }

    /// Returns the subtype byte.
    #[must_use]
    pub const fn subtype(&self) -> u8 {
        self.subtype
    }

    /// Returns the payload.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }

    /// Returns the underlying cell.
    #[must_use]
    pub const fn cell(&self) -> &ByteCell {
        &self.bytes
    }
}

impl fmt::Debug for BinData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinData({}, \"", self.subtype)?;
        for byte in self.bytes() {
            write!(f, "{byte:02X}")?;
        }
        write!(f, "\")")
    }
}
