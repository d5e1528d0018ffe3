//! # Primitive Kinds
//!
//! The closed set of item types a collection or regular array can hold. The
//! kind is written as the first byte of every buffer so a buffer opened with
//! the wrong Rust item type is rejected instead of misread.
//!
//! ## Natural Widths
//!
//! | Kind | Width | Storage |
//! |------|-------|---------|
//! | Boolean | 1 bit | packed eight per byte |
//! | Byte | 1 | `u8` |
//! | Int16 | 2 | `i16` LE, compactable |
//! | Int32 | 4 | `i32` LE, compactable |
//! | Int64 | 8 | `i64` LE, compactable |
//! | Single | 4 | IEEE-754 `f32` bits |
//! | Double | 8 | IEEE-754 `f64` bits |
//! | Timestamp | 8 | `i64` microseconds since the Unix epoch |
//! | Guid | 16 | canonical byte order |
//! | Text | variable | length prefix + codepage bytes |
//! | Raw | variable | length prefix + bytes |

use crate::error::CodecError;
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean = 0,
    Byte = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Single = 5,
    Double = 6,
    Timestamp = 7,
    Guid = 8,
    Text = 9,
    Raw = 10,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 11] = [
        Self::Boolean,
        Self::Byte,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Single,
        Self::Double,
        Self::Timestamp,
        Self::Guid,
        Self::Text,
        Self::Raw,
    ];

    /// Fixed byte width of one item, or None for variable-width kinds.
    ///
    /// Boolean reports 1 here although its items are bit-packed in a body.
    pub const fn natural_width(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::Byte => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 | Self::Single => Some(4),
            Self::Int64 | Self::Double | Self::Timestamp => Some(8),
            Self::Guid => Some(16),
            Self::Text | Self::Raw => None,
        }
    }

    pub const fn is_variable(self) -> bool {
        self.natural_width().is_none()
    }

    /// Integer kinds whose item width may be re-selected in compact mode.
    pub const fn is_compactable(self) -> bool {
        matches!(self, Self::Byte | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_bit_packed(self) -> bool {
        matches!(self, Self::Boolean)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Timestamp => "Timestamp",
            Self::Guid => "Guid",
            Self::Text => "Text",
            Self::Raw => "Raw",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for PrimitiveKind {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| {
                eyre::Report::new(CodecError::malformed(format!("invalid kind tag: {}", value)))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_widths() {
        assert_eq!(PrimitiveKind::Boolean.natural_width(), Some(1));
        assert_eq!(PrimitiveKind::Int16.natural_width(), Some(2));
        assert_eq!(PrimitiveKind::Single.natural_width(), Some(4));
        assert_eq!(PrimitiveKind::Timestamp.natural_width(), Some(8));
        assert_eq!(PrimitiveKind::Guid.natural_width(), Some(16));
        assert_eq!(PrimitiveKind::Text.natural_width(), None);
        assert_eq!(PrimitiveKind::Raw.natural_width(), None);
    }

    #[test]
    fn only_integers_are_compactable() {
        let compactable: Vec<_> = PrimitiveKind::ALL
            .into_iter()
            .filter(|k| k.is_compactable())
            .collect();
        assert_eq!(
            compactable,
            vec![
                PrimitiveKind::Byte,
                PrimitiveKind::Int16,
                PrimitiveKind::Int32,
                PrimitiveKind::Int64
            ]
        );
    }

    #[test]
    fn tag_roundtrip_and_rejection() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::try_from(kind as u8).unwrap(), kind);
        }
        assert!(PrimitiveKind::try_from(11).is_err());
        assert!(PrimitiveKind::try_from(255).is_err());
    }
}
