//! # Codec Error Kinds
//!
//! Every fallible function in binarray returns `eyre::Result`. Failures that a
//! caller may want to discriminate are raised as a [`CodecError`] inside the
//! report, so the kind survives the trip through `?`:
//!
//! ```ignore
//! use binarray::CodecError;
//!
//! let err = coll.get(10).unwrap_err();
//! assert!(matches!(
//!     err.downcast_ref::<CodecError>(),
//!     Some(CodecError::IndexOutOfRange { index: 10, .. })
//! ));
//! ```
//!
//! No operation mutates its inputs, so an error never leaves a half-written
//! buffer behind.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("value {value} does not fit a {width}-byte size encoding")]
    EncodingOverflow { value: u128, width: usize },

    #[error("truncated buffer: need {needed} bytes at offset {offset}, {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),

    #[error("index {index} out of range (len={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("range [{start}, {start}+{count}) out of bounds (len={len})")]
    RangeOutOfBounds {
        start: usize,
        count: usize,
        len: usize,
    },

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("codepage not found: {0}")]
    CodepageNotFound(String),

    #[error("character {ch:?} cannot be represented in codepage {codepage}")]
    UnmappableCharacter { ch: char, codepage: u16 },

    #[error("invalid rank {rank}: must be between 1 and {max}")]
    InvalidRank { rank: usize, max: usize },
}

impl CodecError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedBuffer(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

/// Returns the codec error carried by `report`, if any.
pub fn codec_error(report: &eyre::Report) -> Option<&CodecError> {
    report.downcast_ref::<CodecError>()
}
