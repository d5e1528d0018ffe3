//! # Fixed-Width Size Encoding
//!
//! Counts, indices, item lengths and dimension extents are written with one
//! of four fixed widths. The width is picked by the caller when a buffer is
//! created and recorded in the buffer's flags byte, so every size field of a
//! buffer has the same, known width and can be patched in place.
//!
//! ## Encoding Format
//!
//! | Variant | Code | Bytes | Max value                  |
//! |---------|------|-------|----------------------------|
//! | `One`   | 0    | 1     | 255                        |
//! | `Two`   | 1    | 2     | 65535                      |
//! | `Four`  | 2    | 4     | 4294967295                 |
//! | `Eight` | 3    | 8     | 18446744073709551615       |
//!
//! Values are little-endian. A value larger than the chosen width can hold is
//! rejected with `EncodingOverflow`; the width of an existing buffer is never
//! widened implicitly.
//!
//! ## Usage Example
//!
//! ```rust
//! use binarray::encoding::{decode_size, encode_size, SizeEncoding};
//!
//! let mut buf = [0u8; 8];
//! let written = encode_size(1000, SizeEncoding::Two, &mut buf).unwrap();
//! assert_eq!(written, 2);
//!
//! let (value, read) = decode_size(&buf, SizeEncoding::Two, 0).unwrap();
//! assert_eq!(value, 1000);
//! assert_eq!(read, 2);
//! ```
//!
//! ## Thread Safety
//!
//! All functions are pure and allocation-free apart from [`write_size`],
//! which appends to a caller-owned vector.

use crate::error::CodecError;
use eyre::{bail, ensure, Result};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SizeEncoding {
    One = 0,
    Two = 1,
    #[default]
    Four = 2,
    Eight = 3,
}

impl SizeEncoding {
    pub const ALL: [SizeEncoding; 4] = [Self::One, Self::Two, Self::Four, Self::Eight];

    pub const fn width(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::One),
            1 => Ok(Self::Two),
            2 => Ok(Self::Four),
            3 => Ok(Self::Eight),
            _ => bail!(CodecError::malformed(format!("invalid size code {}", code))),
        }
    }

    pub fn from_width(width: usize) -> Option<Self> {
        match width {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            4 => Some(Self::Four),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    pub const fn max_value(self) -> u64 {
        match self {
            Self::One => u8::MAX as u64,
            Self::Two => u16::MAX as u64,
            Self::Four => u32::MAX as u64,
            Self::Eight => u64::MAX,
        }
    }

    /// Smallest encoding able to hold `value`.
    pub fn smallest_for(value: u64) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| value <= s.max_value())
            .unwrap_or(Self::Eight)
    }

    pub fn check(self, value: usize) -> Result<()> {
        ensure!(
            value as u64 <= self.max_value(),
            CodecError::EncodingOverflow {
                value: value as u128,
                width: self.width(),
            }
        );
        Ok(())
    }
}

/// Writes `value` into the first `sizing.width()` bytes of `buf`.
pub fn encode_size(value: u64, sizing: SizeEncoding, buf: &mut [u8]) -> Result<usize> {
    let width = sizing.width();
    ensure!(
        value <= sizing.max_value(),
        CodecError::EncodingOverflow {
            value: value as u128,
            width,
        }
    );
    ensure!(
        buf.len() >= width,
        CodecError::TruncatedBuffer {
            offset: 0,
            needed: width,
            available: buf.len(),
        }
    );
    buf[..width].copy_from_slice(&value.to_le_bytes()[..width]);
    Ok(width)
}

/// Appends `value` to `out` using `sizing`.
pub fn write_size(value: usize, sizing: SizeEncoding, out: &mut Vec<u8>) -> Result<()> {
    sizing.check(value)?;
    out.extend_from_slice(&(value as u64).to_le_bytes()[..sizing.width()]);
    Ok(())
}

/// Reads a size field at `offset`, returning the value and the bytes consumed.
pub fn decode_size(buf: &[u8], sizing: SizeEncoding, offset: usize) -> Result<(u64, usize)> {
    let width = sizing.width();
    let available = buf.len().saturating_sub(offset);
    ensure!(
        available >= width,
        CodecError::TruncatedBuffer {
            offset,
            needed: width,
            available,
        }
    );
    let mut raw = [0u8; 8];
    raw[..width].copy_from_slice(&buf[offset..offset + width]);
    Ok((u64::from_le_bytes(raw), width))
}

/// Like [`decode_size`] but converts the value to `usize`.
pub(crate) fn decode_len(buf: &[u8], sizing: SizeEncoding, offset: usize) -> Result<usize> {
    let (value, _) = decode_size(buf, sizing, offset)?;
    usize::try_from(value).map_err(|_| {
        eyre::Report::new(CodecError::malformed(format!(
            "size field {} exceeds addressable memory",
            value
        )))
    })
}
