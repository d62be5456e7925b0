//! Configuration for spill decoding.

use docvalue_foundation::MAX_DEPTH;
use docvalue_foundation::limits::MAX_DOCUMENT_SIZE;

/// Limits enforced while decoding a spill stream.
///
/// Spill files are written and read by the same process, so these limits
/// guard against corruption rather than hostile input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpillConfig {
    max_depth: usize,
    max_payload_len: usize,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_payload_len: MAX_DOCUMENT_SIZE,
        }
    }
}

impl SpillConfig {
    /// Deepest container nesting accepted. Never above [`MAX_DEPTH`].
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Largest length prefix accepted for a single string or binary payload.
    #[must_use]
    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    /// Builder method to set the nesting limit, clamped to [`MAX_DEPTH`].
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.min(MAX_DEPTH);
        self
    }

    /// Builder method to set the payload length limit.
    #[must_use]
    pub fn with_max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = len;
        self
    }
}
