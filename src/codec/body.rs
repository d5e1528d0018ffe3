//! # Item Body Layouts
//!
//! The body follows the shape fields and holds the items in order. Three
//! layouts cover the eleven kinds:
//!
//! | Layout | Kinds | Item `i` lives at |
//! |--------|-------|-------------------|
//! | `Bits` | Boolean | bit `i % 8` of byte `i / 8` |
//! | `Fixed(w)` | fixed-width kinds | bytes `i*w .. (i+1)*w` |
//! | `Prefixed(s)` | Text, Raw | after walking `i` `[len][payload]` entries |
//!
//! Fixed and bit layouts give O(1) access. Prefixed bodies carry no offset
//! table, so reaching item `i` walks the `i` length prefixes before it;
//! sequential access goes through a [`Cursor`] so enumeration stays linear.
//!
//! ## Mutation
//!
//! Bodies are never patched in place. [`splice`] and [`overwrite`] read the
//! old body and produce a fresh one:
//!
//! - fixed, non-compact bodies copy the untouched byte ranges around the
//!   edited span
//! - prefixed bodies do the same, with the span located by walking prefixes,
//!   so every later item simply moves with the copy
//! - bit bodies patch bits when the item count is unchanged, otherwise repack
//! - compact bodies are decoded and re-encoded, because the stored width must
//!   stay the smallest one covering the new content

use crate::codec::header::Preamble;
use crate::codec::item::Item;
use crate::encoding::sizing::decode_len;
use crate::encoding::{encode_size, SizeEncoding};
use crate::error::CodecError;
use crate::types::Codepage;
use eyre::{bail, ensure, Result};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    Bits,
    Fixed(usize),
    Prefixed(SizeEncoding),
}

/// Borrowed view of a body holding `len` items.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Body<'a> {
    bytes: &'a [u8],
    layout: Layout,
    codepage: Codepage,
    len: usize,
}

/// Position of the next item read by [`Body::read`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub index: usize,
    offset: usize,
}

impl<'a> Body<'a> {
    /// Wraps a body whose structure was already validated.
    pub fn new(bytes: &'a [u8], layout: Layout, codepage: Codepage, len: usize) -> Self {
        Self {
            bytes,
            layout,
            codepage,
            len,
        }
    }

    /// Wraps a foreign body, checking that `bytes` holds exactly `len`
    /// items and that Boolean padding bits are zero.
    pub fn open(bytes: &'a [u8], layout: Layout, codepage: Codepage, len: usize) -> Result<Self> {
        let body = Self::new(bytes, layout, codepage, len);
        let expected = match layout {
            Layout::Bits => len.div_ceil(8),
            Layout::Fixed(width) => len.checked_mul(width).ok_or_else(|| {
                eyre::Report::new(CodecError::malformed(format!(
                    "{} items of {} bytes overflow the address space",
                    len, width
                )))
            })?,
            Layout::Prefixed(_) => body.end_offset()?,
        };
        ensure!(
            bytes.len() >= expected,
            CodecError::TruncatedBuffer {
                offset: 0,
                needed: expected,
                available: bytes.len(),
            }
        );
        ensure!(
            bytes.len() == expected,
            CodecError::malformed(format!(
                "{} trailing bytes after body",
                bytes.len() - expected
            ))
        );
        if layout == Layout::Bits && len % 8 != 0 {
            let last = bytes[expected - 1];
            ensure!(
                last >> (len % 8) == 0,
                CodecError::malformed("non-zero padding bits in boolean body")
            );
        }
        Ok(body)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Walks every length prefix and returns the offset just past the last
    /// item. Only meaningful for prefixed bodies.
    fn end_offset(&self) -> Result<usize> {
        let mut cursor = Cursor::default();
        self.seek(&mut cursor, self.len)?;
        Ok(cursor.offset)
    }

    fn prefixed_item(&self, offset: usize, sizing: SizeEncoding) -> Result<Range<usize>> {
        let len = decode_len(self.bytes, sizing, offset)?;
        let start = offset + sizing.width();
        let available = self.bytes.len() - start;
        ensure!(
            len <= available,
            CodecError::TruncatedBuffer {
                offset: start,
                needed: len,
                available,
            }
        );
        Ok(start..start + len)
    }

    /// Moves `cursor` forward to item `index`.
    pub fn seek(&self, cursor: &mut Cursor, index: usize) -> Result<()> {
        debug_assert!(index >= cursor.index);
        match self.layout {
            Layout::Bits => {}
            Layout::Fixed(width) => cursor.offset = index * width,
            Layout::Prefixed(sizing) => {
                while cursor.index < index {
                    cursor.offset = self.prefixed_item(cursor.offset, sizing)?.end;
                    cursor.index += 1;
                }
            }
        }
        cursor.index = index;
        Ok(())
    }

    pub fn cursor_at(&self, index: usize) -> Result<Cursor> {
        let mut cursor = Cursor::default();
        self.seek(&mut cursor, index)?;
        Ok(cursor)
    }

    /// Byte range of the encoded item under `cursor`.
    fn item_range(&self, cursor: &Cursor) -> Result<Range<usize>> {
        match self.layout {
            Layout::Bits => bail!(CodecError::malformed("bit-packed items have no byte range")),
            Layout::Fixed(width) => Ok(cursor.offset..cursor.offset + width),
            Layout::Prefixed(sizing) => self.prefixed_item(cursor.offset, sizing),
        }
    }

    fn bit(&self, index: usize) -> bool {
        self.bytes[index / 8] & (1 << (index % 8)) != 0
    }

    /// Decodes the item under `cursor` and advances past it.
    pub fn read<T: Item>(&self, cursor: &mut Cursor) -> Result<T> {
        ensure!(
            cursor.index < self.len,
            CodecError::IndexOutOfRange {
                index: cursor.index,
                len: self.len,
            }
        );
        let value = match self.layout {
            Layout::Bits => T::decode(&[self.bit(cursor.index) as u8], self.codepage)?,
            Layout::Fixed(_) | Layout::Prefixed(_) => {
                let range = self.item_range(cursor)?;
                cursor.offset = range.end;
                T::decode(&self.bytes[range], self.codepage)?
            }
        };
        cursor.index += 1;
        Ok(value)
    }

    pub fn get<T: Item>(&self, index: usize) -> Result<T> {
        ensure!(
            index < self.len,
            CodecError::IndexOutOfRange {
                index,
                len: self.len,
            }
        );
        let mut cursor = self.cursor_at(index)?;
        self.read(&mut cursor)
    }

    pub fn decode_range<T: Item>(&self, start: usize, count: usize) -> Result<Vec<T>> {
        let mut cursor = self.cursor_at(start)?;
        (0..count).map(|_| self.read(&mut cursor)).collect()
    }

    pub fn decode_all<T: Item>(&self) -> Result<Vec<T>> {
        self.decode_range(0, self.len)
    }

    /// Byte span of items `start .. start + count`.
    fn span(&self, start: usize, count: usize) -> Result<Range<usize>> {
        let mut cursor = self.cursor_at(start)?;
        let from = cursor.offset;
        self.seek(&mut cursor, start + count)?;
        Ok(from..cursor.offset)
    }

    /// Finds `needle` among items `range`, scanning backwards when `reverse`
    /// is set. Comparison is on encoded bytes, so floats compare bitwise.
    pub fn position<T: Item>(
        &self,
        needle: &T,
        range: Range<usize>,
        reverse: bool,
    ) -> Result<Option<usize>> {
        let mut encoded = Vec::new();
        match self.layout {
            Layout::Bits => {
                let bit = bit_of(needle)?;
                let mut hits = range.filter(|&i| self.bit(i) == bit);
                return Ok(if reverse { hits.next_back() } else { hits.next() });
            }
            Layout::Fixed(width) => {
                if needle.compact_width() > width {
                    return Ok(None);
                }
                needle.encode(width, self.codepage, &mut encoded)?;
            }
            Layout::Prefixed(_) => {
                if needle.encode(0, self.codepage, &mut encoded).is_err() {
                    return Ok(None);
                }
            }
        }

        let mut cursor = self.cursor_at(range.start)?;
        let mut found = None;
        while cursor.index < range.end {
            let item = self.item_range(&cursor)?;
            if self.bytes[item.clone()] == encoded[..] {
                found = Some(cursor.index);
                if !reverse {
                    break;
                }
            }
            cursor.offset = item.end;
            cursor.index += 1;
        }
        Ok(found)
    }
}

fn bit_of<T: Item>(item: &T) -> Result<bool> {
    let mut scratch = Vec::with_capacity(1);
    item.encode(1, Codepage::default(), &mut scratch)?;
    Ok(scratch.first().is_some_and(|b| *b != 0))
}

/// Smallest compact width covering every item; `One` when there are none.
pub(crate) fn required_width<'a, T: Item + 'a>(items: impl IntoIterator<Item = &'a T>) -> SizeEncoding {
    let width = items
        .into_iter()
        .map(Item::compact_width)
        .max()
        .unwrap_or(1);
    SizeEncoding::from_width(width).unwrap_or(SizeEncoding::Eight)
}

/// Appends the encoding of `items` under `layout`.
pub(crate) fn encode_items<'a, T: Item + 'a>(
    items: impl IntoIterator<Item = &'a T>,
    layout: Layout,
    codepage: Codepage,
    out: &mut Vec<u8>,
) -> Result<()> {
    match layout {
        Layout::Bits => {
            let mut scratch = Vec::with_capacity(1);
            for (i, item) in items.into_iter().enumerate() {
                if i % 8 == 0 {
                    out.push(0);
                }
                scratch.clear();
                item.encode(1, codepage, &mut scratch)?;
                if scratch.first().is_some_and(|b| *b != 0) {
                    if let Some(last) = out.last_mut() {
                        *last |= 1 << (i % 8);
                    }
                }
            }
        }
        Layout::Fixed(width) => {
            for item in items {
                item.encode(width, codepage, out)?;
            }
        }
        Layout::Prefixed(sizing) => {
            for item in items {
                let prefix_at = out.len();
                out.resize(prefix_at + sizing.width(), 0);
                item.encode(0, codepage, out)?;
                let payload = out.len() - prefix_at - sizing.width();
                encode_size(payload as u64, sizing, &mut out[prefix_at..])?;
            }
        }
    }
    Ok(())
}

/// Encodes `items` as a complete body, re-selecting the compact width first.
pub(crate) fn encode_body<T: Item>(pre: Preamble, items: &[T]) -> Result<(Preamble, Vec<u8>)> {
    let pre = match pre.compact {
        Some(_) => pre.with_item_width(required_width(items)),
        None => pre,
    };
    let mut out = Vec::new();
    encode_items(items, pre.layout(), pre.codepage, &mut out)?;
    Ok((pre, out))
}

/// Decodes every item of a foreign body and checks that a compact body
/// stores the smallest width its content allows.
pub(crate) fn validate_items<T: Item>(pre: &Preamble, body: &Body<'_>) -> Result<()> {
    let items = body.decode_all::<T>()?;
    if let Some(width) = pre.compact {
        let required = required_width(&items);
        ensure!(
            required == width,
            CodecError::malformed(format!(
                "compact width {} where content needs {}",
                width.width(),
                required.width()
            ))
        );
    }
    Ok(())
}

/// Replaces items `index .. index + remove` with `insert`.
pub(crate) fn splice<T: Item>(
    pre: Preamble,
    body: &Body<'_>,
    index: usize,
    remove: usize,
    insert: &[T],
) -> Result<(Preamble, Vec<u8>)> {
    ensure!(
        index
            .checked_add(remove)
            .is_some_and(|end| end <= body.len),
        CodecError::RangeOutOfBounds {
            start: index,
            count: remove,
            len: body.len,
        }
    );

    match (pre.compact, body.layout) {
        (None, Layout::Fixed(_)) | (None, Layout::Prefixed(_)) => {
            let span = body.span(index, remove)?;
            let mut out = Vec::with_capacity(body.bytes.len() - span.len());
            out.extend_from_slice(&body.bytes[..span.start]);
            encode_items(insert, body.layout, body.codepage, &mut out)?;
            out.extend_from_slice(&body.bytes[span.end..]);
            Ok((pre, out))
        }
        (None, Layout::Bits) if remove == insert.len() => {
            let mut out = body.bytes.to_vec();
            for (offset, item) in insert.iter().enumerate() {
                set_bit(&mut out, index + offset, bit_of(item)?);
            }
            Ok((pre, out))
        }
        _ => {
            let mut items = body.decode_all::<T>()?;
            items.splice(index..index + remove, insert.iter().cloned());
            encode_body(pre, &items)
        }
    }
}

/// Writes each `(index, value)` pair over the existing item count.
pub(crate) fn overwrite<'a, T: Item + 'a>(
    pre: Preamble,
    body: &Body<'_>,
    writes: impl IntoIterator<Item = (usize, &'a T)>,
) -> Result<(Preamble, Vec<u8>)> {
    let writes = writes.into_iter();
    match (pre.compact, body.layout) {
        (None, Layout::Fixed(width)) => {
            let mut out = body.bytes.to_vec();
            let mut scratch = Vec::with_capacity(width);
            for (index, value) in writes {
                ensure!(
                    index < body.len,
                    CodecError::IndexOutOfRange {
                        index,
                        len: body.len,
                    }
                );
                scratch.clear();
                value.encode(width, body.codepage, &mut scratch)?;
                out[index * width..(index + 1) * width].copy_from_slice(&scratch);
            }
            Ok((pre, out))
        }
        (None, Layout::Bits) => {
            let mut out = body.bytes.to_vec();
            for (index, value) in writes {
                ensure!(
                    index < body.len,
                    CodecError::IndexOutOfRange {
                        index,
                        len: body.len,
                    }
                );
                set_bit(&mut out, index, bit_of(value)?);
            }
            Ok((pre, out))
        }
        _ => {
            let mut items = body.decode_all::<T>()?;
            for (index, value) in writes {
                let len = items.len();
                let slot = items
                    .get_mut(index)
                    .ok_or(CodecError::IndexOutOfRange { index, len })?;
                *slot = value.clone();
            }
            encode_body(pre, &items)
        }
    }
}

fn set_bit(bytes: &mut [u8], index: usize, value: bool) {
    let mask = 1 << (index % 8);
    if value {
        bytes[index / 8] |= mask;
    } else {
        bytes[index / 8] &= !mask;
    }
}
