//! # Item Codec
//!
//! The [`Item`] trait captures everything the collection and regular array
//! codecs need to know about one primitive kind: its tag, how wide it is,
//! how it is written to and read from bytes, and its literal grammar. The
//! codecs are generic over `T: Item`, so each of the eleven kinds is
//! instantiated once at compile time with no runtime type dispatch.
//!
//! | Rust type | Kind |
//! |-----------|------|
//! | `bool` | Boolean |
//! | `u8` | Byte |
//! | `i16`, `i32`, `i64` | Int16, Int32, Int64 |
//! | `f32`, `f64` | Single, Double |
//! | [`Timestamp`] | Timestamp |
//! | [`Guid`] | Guid |
//! | `String` | Text |
//! | `Vec<u8>` | Raw |
//!
//! ## Widths
//!
//! Fixed kinds write exactly `width` bytes. For integer kinds `width` may be
//! narrower than the natural width when a buffer is compact; values are then
//! truncated on write and sign-extended on read, which is lossless because
//! the buffer's width is always at least the largest [`Item::compact_width`]
//! of its items. Variable kinds write only their payload; the body codec
//! adds the length prefix.

use crate::error::CodecError;
use crate::parsing::literal;
use crate::types::{Codepage, Guid, PrimitiveKind, Timestamp};
use eyre::{ensure, Result};
use std::fmt::{self, Write};

pub trait Item: Clone + Default + PartialEq + fmt::Debug + Sized {
    const KIND: PrimitiveKind;

    /// Smallest of 1, 2, 4 or 8 bytes that holds this value losslessly.
    fn compact_width(&self) -> usize {
        Self::KIND.natural_width().unwrap_or(1)
    }

    /// Appends the encoded item. `width` is ignored by variable kinds.
    fn encode(&self, width: usize, codepage: Codepage, out: &mut Vec<u8>) -> Result<()>;

    /// Decodes an item from exactly the bytes [`Item::encode`] produced.
    fn decode(bytes: &[u8], codepage: Codepage) -> Result<Self>;

    /// Parses one literal token. `quoted` is set when the token was written
    /// between quotes and has already been unescaped.
    fn parse_literal(token: &str, quoted: bool) -> Result<Self>;

    fn format_literal(&self, out: &mut String);
}

fn fixed<const N: usize>(bytes: &[u8], kind: PrimitiveKind) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        eyre::Report::new(CodecError::malformed(format!(
            "{} item needs {} bytes, got {}",
            kind,
            N,
            bytes.len()
        )))
    })
}

/// Sign-extends a 1 to 8 byte little-endian two's complement value.
fn read_signed(bytes: &[u8], kind: PrimitiveKind) -> Result<i64> {
    ensure!(
        (1..=8).contains(&bytes.len()),
        CodecError::malformed(format!("invalid {} item width {}", kind, bytes.len()))
    );
    let negative = bytes[bytes.len() - 1] & 0x80 != 0;
    let mut raw = if negative { [0xFF; 8] } else { [0u8; 8] };
    raw[..bytes.len()].copy_from_slice(bytes);
    Ok(i64::from_le_bytes(raw))
}

fn signed_width(v: i64) -> usize {
    if i8::try_from(v).is_ok() {
        1
    } else if i16::try_from(v).is_ok() {
        2
    } else if i32::try_from(v).is_ok() {
        4
    } else {
        8
    }
}

impl Item for bool {
    const KIND: PrimitiveKind = PrimitiveKind::Boolean;

    fn encode(&self, _width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        out.push(*self as u8);
        Ok(())
    }

    fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
        let [b] = fixed::<1>(bytes, Self::KIND)?;
        Ok(b != 0)
    }

    fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
        literal::parse_bool(token)
    }

    fn format_literal(&self, out: &mut String) {
        literal::format_bool(*self, out);
    }
}

impl Item for u8 {
    const KIND: PrimitiveKind = PrimitiveKind::Byte;

    fn compact_width(&self) -> usize {
        1
    }

    fn encode(&self, _width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        out.push(*self);
        Ok(())
    }

    fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
        let [b] = fixed::<1>(bytes, Self::KIND)?;
        Ok(b)
    }

    fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
        literal::parse_number(token, Self::KIND.name())
    }

    fn format_literal(&self, out: &mut String) {
        let _ = write!(out, "{}", self);
    }
}

macro_rules! impl_signed_item {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Item for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;

                fn compact_width(&self) -> usize {
                    signed_width(*self as i64)
                }

                fn encode(&self, width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
                    ensure!(
                        width <= std::mem::size_of::<$ty>() && width >= self.compact_width(),
                        CodecError::EncodingOverflow {
                            value: self.unsigned_abs() as u128,
                            width,
                        }
                    );
                    out.extend_from_slice(&(*self as i64).to_le_bytes()[..width]);
                    Ok(())
                }

                fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
                    let wide = read_signed(bytes, Self::KIND)?;
                    <$ty>::try_from(wide).map_err(|_| {
                        eyre::Report::new(CodecError::malformed(format!(
                            "{} item {} out of range",
                            Self::KIND,
                            wide
                        )))
                    })
                }

                fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
                    literal::parse_number(token, Self::KIND.name())
                }

                fn format_literal(&self, out: &mut String) {
                    let _ = write!(out, "{}", self);
                }
            }
        )*
    };
}

impl_signed_item!(i16 => Int16, i32 => Int32, i64 => Int64);

impl Item for f32 {
    const KIND: PrimitiveKind = PrimitiveKind::Single;

    fn encode(&self, _width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }

    fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
        Ok(f32::from_le_bytes(fixed::<4>(bytes, Self::KIND)?))
    }

    fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
        literal::parse_f32(token, Self::KIND.name())
    }

    fn format_literal(&self, out: &mut String) {
        literal::format_f32(*self, out);
    }
}

impl Item for f64 {
    const KIND: PrimitiveKind = PrimitiveKind::Double;

    fn encode(&self, _width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.to_le_bytes());
        Ok(())
    }

    fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
        Ok(f64::from_le_bytes(fixed::<8>(bytes, Self::KIND)?))
    }

    fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
        literal::parse_f64(token, Self::KIND.name())
    }

    fn format_literal(&self, out: &mut String) {
        literal::format_f64(*self, out);
    }
}

impl Item for Timestamp {
    const KIND: PrimitiveKind = PrimitiveKind::Timestamp;

    fn encode(&self, _width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.0.to_le_bytes());
        Ok(())
    }

    fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
        Ok(Timestamp(i64::from_le_bytes(fixed::<8>(bytes, Self::KIND)?)))
    }

    fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
        literal::parse_timestamp(token).map(Timestamp)
    }

    fn format_literal(&self, out: &mut String) {
        literal::format_timestamp(self.0, out);
    }
}

impl Item for Guid {
    const KIND: PrimitiveKind = PrimitiveKind::Guid;

    fn encode(&self, _width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.0);
        Ok(())
    }

    fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
        Ok(Guid(fixed::<16>(bytes, Self::KIND)?))
    }

    fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
        literal::parse_guid(token).map(Guid)
    }

    fn format_literal(&self, out: &mut String) {
        literal::format_guid(&self.0, out);
    }
}

impl Item for String {
    const KIND: PrimitiveKind = PrimitiveKind::Text;

    fn encode(&self, _width: usize, codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        codepage.encode_into(self, out)
    }

    fn decode(bytes: &[u8], codepage: Codepage) -> Result<Self> {
        codepage.decode(bytes)
    }

    fn parse_literal(token: &str, quoted: bool) -> Result<Self> {
        if quoted {
            Ok(token.to_string())
        } else {
            Ok(token.trim().to_string())
        }
    }

    fn format_literal(&self, out: &mut String) {
        literal::format_quoted(self, out);
    }
}

impl Item for Vec<u8> {
    const KIND: PrimitiveKind = PrimitiveKind::Raw;

    fn encode(&self, _width: usize, _codepage: Codepage, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self);
        Ok(())
    }

    fn decode(bytes: &[u8], _codepage: Codepage) -> Result<Self> {
        Ok(bytes.to_vec())
    }

    fn parse_literal(token: &str, _quoted: bool) -> Result<Self> {
        literal::parse_raw(token)
    }

    fn format_literal(&self, out: &mut String) {
        literal::format_raw(self, out);
    }
}
