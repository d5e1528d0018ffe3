//! # Buffer Preamble
//!
//! Every collection and regular array starts with the same preamble:
//!
//! ```text
//! +----------+----------+---------------------+
//! | kind (1) | flags (1)| codepage id (2, LE) |
//! +----------+----------+---------------------+
//!                         (Text buffers only)
//!
//! flags:  bit 7   reserved, zero
//!         bits 5-6 compact item width code
//!         bit 4   compact
//!         bits 2-3 item sizing code (Text and Raw only)
//!         bits 0-1 count sizing code
//! ```
//!
//! The preamble is followed by the shape fields of the concrete codec
//! (a count, or a rank and its extents), all in the count sizing.
//!
//! [`Policy`] is the caller-facing description of the same information.
//! Resolving a policy against a kind normalizes away the fields the kind
//! does not use, so two policies that differ only in irrelevant fields
//! produce identical buffers.

use crate::codec::body::Layout;
use crate::codec::item::Item;
use crate::config::{
    CodecConfig, CODEPAGE_FIELD_SIZE, COMPACT_FLAG, COMPACT_WIDTH_SHIFT, COUNT_SIZING_SHIFT,
    FLAGS_OFFSET, FLAGS_RESERVED_MASK, ITEM_SIZING_SHIFT, KIND_OFFSET, PREAMBLE_SIZE,
    SIZING_MASK,
};
use crate::encoding::SizeEncoding;
use crate::error::CodecError;
use crate::types::{Codepage, PrimitiveKind};
use eyre::{ensure, Result};
use tracing::debug;

/// Header policy chosen when a buffer is created or parsed.
///
/// `item_sizing` only matters for Text and Raw, `codepage` only for Text,
/// and `compact` only for Byte, Int16, Int32 and Int64. A `None` codepage
/// falls back to [`CodecConfig::default_codepage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Policy {
    pub count_sizing: SizeEncoding,
    pub item_sizing: SizeEncoding,
    pub codepage: Option<Codepage>,
    pub compact: bool,
}

impl Policy {
    pub fn new(count_sizing: SizeEncoding) -> Self {
        Self {
            count_sizing,
            ..Self::default()
        }
    }

    pub fn with_item_sizing(mut self, item_sizing: SizeEncoding) -> Self {
        self.item_sizing = item_sizing;
        self
    }

    pub fn with_codepage(mut self, codepage: Codepage) -> Self {
        self.codepage = Some(codepage);
        self
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Preamble {
    pub kind: PrimitiveKind,
    pub count_sizing: SizeEncoding,
    pub item_sizing: SizeEncoding,
    /// Stored item width when the buffer is compact.
    pub compact: Option<SizeEncoding>,
    pub codepage: Codepage,
}

impl Preamble {
    pub fn resolve<T: Item>(policy: &Policy, config: &CodecConfig) -> Self {
        let kind = T::KIND;
        Self {
            kind,
            count_sizing: policy.count_sizing,
            item_sizing: if kind.is_variable() {
                policy.item_sizing
            } else {
                SizeEncoding::One
            },
            compact: (kind.is_compactable() && policy.compact).then_some(SizeEncoding::One),
            codepage: if kind == PrimitiveKind::Text {
                policy.codepage.unwrap_or(config.default_codepage)
            } else {
                Codepage::default()
            },
        }
    }

    pub fn policy(&self) -> Policy {
        Policy {
            count_sizing: self.count_sizing,
            item_sizing: self.item_sizing,
            codepage: (self.kind == PrimitiveKind::Text).then_some(self.codepage),
            compact: self.compact.is_some(),
        }
    }

    pub fn has_codepage(&self) -> bool {
        self.kind == PrimitiveKind::Text
    }

    pub fn encoded_len(&self) -> usize {
        if self.has_codepage() {
            PREAMBLE_SIZE + CODEPAGE_FIELD_SIZE
        } else {
            PREAMBLE_SIZE
        }
    }

    pub fn layout(&self) -> Layout {
        match (self.kind.natural_width(), self.compact) {
            _ if self.kind.is_bit_packed() => Layout::Bits,
            (None, _) => Layout::Prefixed(self.item_sizing),
            (Some(_), Some(width)) => Layout::Fixed(width.width()),
            (Some(width), None) => Layout::Fixed(width),
        }
    }

    fn flags(&self) -> u8 {
        let mut flags = (self.count_sizing.code() << COUNT_SIZING_SHIFT)
            | (self.item_sizing.code() << ITEM_SIZING_SHIFT);
        if let Some(width) = self.compact {
            flags |= COMPACT_FLAG | (width.code() << COMPACT_WIDTH_SHIFT);
        }
        flags
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.kind as u8);
        out.push(self.flags());
        if self.has_codepage() {
            out.extend_from_slice(&self.codepage.id().to_le_bytes());
        }
    }

    /// Reads and validates a preamble, requiring the kind tag of `T`.
    pub fn read<T: Item>(bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() >= PREAMBLE_SIZE,
            CodecError::TruncatedBuffer {
                offset: 0,
                needed: PREAMBLE_SIZE,
                available: bytes.len(),
            }
        );
        let kind = PrimitiveKind::try_from(bytes[KIND_OFFSET])?;
        ensure!(
            kind == T::KIND,
            CodecError::malformed(format!("expected a {} buffer, found {}", T::KIND, kind))
        );

        let flags = bytes[FLAGS_OFFSET];
        ensure!(
            flags & FLAGS_RESERVED_MASK == 0,
            CodecError::malformed(format!("reserved flag bits set: {:#04x}", flags))
        );
        let count_sizing = SizeEncoding::from_code((flags >> COUNT_SIZING_SHIFT) & SIZING_MASK)?;
        let item_sizing = SizeEncoding::from_code((flags >> ITEM_SIZING_SHIFT) & SIZING_MASK)?;
        ensure!(
            kind.is_variable() || item_sizing == SizeEncoding::One,
            CodecError::malformed(format!("{} buffer carries an item sizing", kind))
        );

        let width_code = (flags >> COMPACT_WIDTH_SHIFT) & SIZING_MASK;
        let compact = if flags & COMPACT_FLAG != 0 {
            ensure!(
                kind.is_compactable(),
                CodecError::malformed(format!("{} buffer cannot be compact", kind))
            );
            let width = SizeEncoding::from_code(width_code)?;
            ensure!(
                Some(width.width()) <= kind.natural_width(),
                CodecError::malformed(format!(
                    "compact width {} exceeds {} natural width",
                    width.width(),
                    kind
                ))
            );
            Some(width)
        } else {
            ensure!(
                width_code == 0,
                CodecError::malformed("compact width set on a non-compact buffer")
            );
            None
        };

        let codepage = if kind == PrimitiveKind::Text {
            let needed = PREAMBLE_SIZE + CODEPAGE_FIELD_SIZE;
            ensure!(
                bytes.len() >= needed,
                CodecError::TruncatedBuffer {
                    offset: PREAMBLE_SIZE,
                    needed: CODEPAGE_FIELD_SIZE,
                    available: bytes.len() - PREAMBLE_SIZE,
                }
            );
            Codepage::from_id(u16::from_le_bytes([bytes[2], bytes[3]]))?
        } else {
            Codepage::default()
        };

        Ok(Self {
            kind,
            count_sizing,
            item_sizing,
            compact,
            codepage,
        })
    }

    /// Returns the preamble a compact buffer holding `width`-wide items
    /// needs. Non-compact preambles are returned unchanged.
    pub fn with_item_width(self, width: SizeEncoding) -> Self {
        match self.compact {
            Some(current) if current != width => {
                debug!(
                    kind = %self.kind,
                    from = current.width(),
                    to = width.width(),
                    "compact item width reselected"
                );
                Self {
                    compact: Some(width),
                    ..self
                }
            }
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codec_error;

    fn resolve<T: Item>(policy: Policy) -> Preamble {
        Preamble::resolve::<T>(&policy, &CodecConfig::default())
    }

    #[test]
    fn irrelevant_policy_fields_are_normalized() {
        let plain = resolve::<f64>(Policy::new(SizeEncoding::Two));
        let noisy = resolve::<f64>(
            Policy::new(SizeEncoding::Two)
                .with_compact(true)
                .with_codepage(Codepage::Latin1)
                .with_item_sizing(SizeEncoding::Eight),
        );
        assert_eq!(plain, noisy);
        assert_eq!(plain.layout(), Layout::Fixed(8));
    }

    #[test]
    fn text_preamble_carries_codepage() {
        let pre = resolve::<String>(
            Policy::new(SizeEncoding::One)
                .with_item_sizing(SizeEncoding::Two)
                .with_codepage(Codepage::Utf16Le),
        );
        let mut out = Vec::new();
        pre.write(&mut out);
        assert_eq!(out, vec![9, 0b0000_0100, 0xB0, 0x04]);
        assert_eq!(Preamble::read::<String>(&out).unwrap(), pre);
        assert_eq!(pre.layout(), Layout::Prefixed(SizeEncoding::Two));
    }

    #[test]
    fn text_defaults_to_config_codepage() {
        let config = CodecConfig::default().with_default_codepage(Codepage::Latin1);
        let pre = Preamble::resolve::<String>(&Policy::default(), &config);
        assert_eq!(pre.codepage, Codepage::Latin1);
        assert_eq!(pre.policy().codepage, Some(Codepage::Latin1));
    }

    #[test]
    fn compact_flags_roundtrip() {
        let pre = resolve::<i32>(Policy::new(SizeEncoding::One).with_compact(true))
            .with_item_width(SizeEncoding::Two);
        let mut out = Vec::new();
        pre.write(&mut out);
        assert_eq!(out, vec![3, COMPACT_FLAG | (1 << COMPACT_WIDTH_SHIFT)]);
        let read = Preamble::read::<i32>(&out).unwrap();
        assert_eq!(read.layout(), Layout::Fixed(2));
        assert!(read.policy().compact);
    }

    #[test]
    fn read_rejects_wrong_kind_and_bad_flags() {
        let err = Preamble::read::<i64>(&[3, 0]).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::MalformedBuffer(_))));

        assert!(Preamble::read::<i32>(&[3, 0x80]).is_err());
        assert!(Preamble::read::<f64>(&[6, COMPACT_FLAG]).is_err());
        assert!(Preamble::read::<i16>(&[2, COMPACT_FLAG | (2 << COMPACT_WIDTH_SHIFT)]).is_err());
        assert!(Preamble::read::<i32>(&[3, 1 << COMPACT_WIDTH_SHIFT]).is_err());
        assert!(Preamble::read::<i32>(&[3, 1 << ITEM_SIZING_SHIFT]).is_err());
    }

    #[test]
    fn read_reports_truncation_and_unknown_codepage() {
        let err = Preamble::read::<bool>(&[0]).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::TruncatedBuffer { .. })));

        let err = Preamble::read::<String>(&[9, 0, 0xB5, 0x01]).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::CodepageNotFound(_))));
    }
}
