//! # Collection Codec
//!
//! A growable sequence of items of one kind:
//!
//! ```text
//! +-----------+---------------------+------------------------+
//! | preamble  | count (count sizing)| body (count items)     |
//! +-----------+---------------------+------------------------+
//! ```
//!
//! The count is cached on open, so [`Collection::count`] is O(1). Every
//! editing operation goes through one splice primitive (replace a span of
//! items with new ones), so Set, Insert, Remove, the ranged forms and Clear
//! share the same bounds checks and the same compact width handling.
//!
//! Out-of-range single positions fail with `IndexOutOfRange`; `(start,
//! count)` pairs that run past the end fail with `RangeOutOfBounds`.
//! Absence in [`Collection::index_of`] is `None`, never an error.

use crate::codec::body::{encode_body, splice, validate_items, Body, Layout};
use crate::codec::enumerate::Enumerate;
use crate::codec::header::{Policy, Preamble};
use crate::codec::item::Item;
use crate::codec::regular::RegularArray;
use crate::codec::{check_index, repeated, resolve_insert, resolve_range};
use crate::config::{CodecConfig, ITEM_DELIMITER};
use crate::encoding::sizing::decode_len;
use crate::encoding::write_size;
use crate::error::CodecError;
use crate::parsing::text;
use crate::types::{Codepage, PrimitiveKind};
use eyre::Result;
use std::fmt;
use std::marker::PhantomData;
use tracing::trace;

#[derive(Clone)]
pub struct Collection<T: Item> {
    bytes: Vec<u8>,
    pre: Preamble,
    count: usize,
    _item: PhantomData<T>,
}

impl<T: Item> Collection<T> {
    /// Creates an empty collection.
    pub fn new(policy: Policy) -> Result<Self> {
        Self::with_config(policy, &CodecConfig::default())
    }

    pub fn with_config(policy: Policy, config: &CodecConfig) -> Result<Self> {
        Self::from_values_with_config(&[], policy, config)
    }

    pub fn from_values(values: &[T], policy: Policy) -> Result<Self> {
        Self::from_values_with_config(values, policy, &CodecConfig::default())
    }

    pub fn from_values_with_config(
        values: &[T],
        policy: Policy,
        config: &CodecConfig,
    ) -> Result<Self> {
        let coll = Self::from_parts(Preamble::resolve::<T>(&policy, config), values)?;
        trace!(kind = %T::KIND, count = coll.count, bytes = coll.bytes.len(), "collection built");
        Ok(coll)
    }

    pub(crate) fn from_parts(pre: Preamble, values: &[T]) -> Result<Self> {
        let (pre, body) = encode_body(pre, values)?;
        Self::assemble(pre, values.len(), &body)
    }

    pub(crate) fn assemble(pre: Preamble, count: usize, body: &[u8]) -> Result<Self> {
        let mut bytes =
            Vec::with_capacity(pre.encoded_len() + pre.count_sizing.width() + body.len());
        pre.write(&mut bytes);
        write_size(count, pre.count_sizing, &mut bytes)?;
        bytes.extend_from_slice(body);
        Ok(Self {
            bytes,
            pre,
            count,
            _item: PhantomData,
        })
    }

    /// Opens a buffer produced elsewhere, validating it completely.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let pre = Preamble::read::<T>(&bytes)?;
        let count = decode_len(&bytes, pre.count_sizing, pre.encoded_len())?;
        let start = pre.encoded_len() + pre.count_sizing.width();
        let body = Body::open(&bytes[start..], pre.layout(), pre.codepage, count)?;
        validate_items::<T>(&pre, &body)?;
        Ok(Self {
            bytes,
            pre,
            count,
            _item: PhantomData,
        })
    }

    /// Parses comma-separated literals, e.g. `1, 2, 3` or `"a", "b"`.
    pub fn parse(text: &str, policy: Policy) -> Result<Self> {
        Self::parse_with_config(text, policy, &CodecConfig::default())
    }

    pub fn parse_with_config(text: &str, policy: Policy, config: &CodecConfig) -> Result<Self> {
        let values = text::split_items(text)?
            .iter()
            .map(|token| T::parse_literal(&token.text, token.quoted))
            .collect::<Result<Vec<_>>>()?;
        trace!(kind = %T::KIND, count = values.len(), "collection parsed");
        Self::from_values_with_config(&values, policy, config)
    }

    pub fn format(&self) -> Result<String> {
        let mut out = String::new();
        for item in self.enumerate(None, None)? {
            let (index, value) = item?;
            if index > 0 {
                out.push(ITEM_DELIMITER);
            }
            value.format_literal(&mut out);
        }
        Ok(out)
    }

    fn body(&self) -> Body<'_> {
        let start = self.pre.encoded_len() + self.pre.count_sizing.width();
        Body::new(
            &self.bytes[start..],
            self.pre.layout(),
            self.pre.codepage,
            self.count,
        )
    }

    pub(crate) fn body_bytes(&self) -> &[u8] {
        self.body().bytes()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn kind(&self) -> PrimitiveKind {
        T::KIND
    }

    /// The policy that reproduces this buffer's header.
    pub fn policy(&self) -> Policy {
        self.pre.policy()
    }

    /// Codepage of Text items; `None` for every other kind.
    pub fn codepage(&self) -> Option<Codepage> {
        self.pre.policy().codepage
    }

    /// Stored width of one item, or `None` for Boolean, Text and Raw.
    pub fn item_width(&self) -> Option<usize> {
        match self.pre.layout() {
            Layout::Fixed(width) => Some(width),
            Layout::Bits | Layout::Prefixed(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.body().decode_all()
    }

    pub fn get(&self, index: usize) -> Result<T> {
        self.body().get(index)
    }

    /// First position holding `value`, compared on encoded bytes.
    pub fn index_of(&self, value: &T) -> Result<Option<usize>> {
        self.body().position(value, 0..self.count, false)
    }

    pub fn last_index_of(&self, value: &T) -> Result<Option<usize>> {
        self.body().position(value, 0..self.count, true)
    }

    pub fn contains(&self, value: &T) -> Result<bool> {
        Ok(self.index_of(value)?.is_some())
    }

    fn spliced(&self, index: usize, remove: usize, insert: &[T]) -> Result<Self> {
        let (pre, body) = splice(self.pre, &self.body(), index, remove, insert)?;
        let count = (self.count - remove).checked_add(insert.len()).ok_or_else(|| {
            eyre::Report::new(CodecError::EncodingOverflow {
                value: self.count as u128 + insert.len() as u128,
                width: self.pre.count_sizing.width(),
            })
        })?;
        Self::assemble(pre, count, &body)
    }

    pub fn set(&self, index: usize, value: &T) -> Result<Self> {
        check_index(index, self.count)?;
        self.spliced(index, 1, std::slice::from_ref(value))
    }

    /// Inserts before `index`; `None` appends.
    pub fn insert(&self, index: Option<usize>, value: &T) -> Result<Self> {
        let index = resolve_insert(index, self.count)?;
        self.spliced(index, 0, std::slice::from_ref(value))
    }

    /// Removes the first occurrence of `value`, if any.
    pub fn remove(&self, value: &T) -> Result<Self> {
        match self.index_of(value)? {
            Some(index) => self.remove_at(index),
            None => Ok(self.clone()),
        }
    }

    pub fn remove_at(&self, index: usize) -> Result<Self> {
        check_index(index, self.count)?;
        self.spliced(index, 1, &[])
    }

    /// Empties the collection, keeping its policy.
    pub fn clear(&self) -> Result<Self> {
        Self::from_parts(self.pre, &[])
    }

    pub fn get_range(&self, index: Option<usize>, count: Option<usize>) -> Result<Self> {
        let range = resolve_range(index, count, self.count)?;
        let items = self.body().decode_range(range.start, range.len())?;
        Self::from_parts(self.pre, &items)
    }

    /// Overwrites `range.count()` items starting at `index`. Never grows the
    /// collection.
    pub fn set_range(&self, index: usize, range: &Collection<T>) -> Result<Self> {
        let items = range.to_vec()?;
        resolve_range(Some(index), Some(items.len()), self.count)?;
        self.spliced(index, items.len(), &items)
    }

    pub fn set_repeat(&self, index: usize, value: &T, count: usize) -> Result<Self> {
        resolve_range(Some(index), Some(count), self.count)?;
        self.spliced(index, count, &repeated(value, count)?)
    }

    pub fn insert_repeat(&self, index: Option<usize>, value: &T, count: usize) -> Result<Self> {
        let index = resolve_insert(index, self.count)?;
        self.pre.count_sizing.check(self.count.saturating_add(count))?;
        self.spliced(index, 0, &repeated(value, count)?)
    }

    pub fn insert_range(&self, index: Option<usize>, range: &Collection<T>) -> Result<Self> {
        let index = resolve_insert(index, self.count)?;
        let items = range.to_vec()?;
        self.spliced(index, 0, &items)
    }

    /// Removes `count` items from `index`; `None` removes to the end.
    pub fn remove_range(&self, index: usize, count: Option<usize>) -> Result<Self> {
        let range = resolve_range(Some(index), count, self.count)?;
        self.spliced(range.start, range.len(), &[])
    }

    /// Reinterprets the collection as a rank-1 regular array.
    pub fn to_array(&self) -> Result<RegularArray<T>> {
        RegularArray::assemble(self.pre, &[self.count], self.body_bytes())
    }

    /// Lazily decodes items `index .. index + count` with their positions.
    pub fn enumerate(&self, index: Option<usize>, count: Option<usize>) -> Result<Enumerate<'_, T>> {
        let range = resolve_range(index, count, self.count)?;
        Enumerate::new(self.body(), range)
    }
}

impl<T: Item> PartialEq for Collection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<T: Item> Eq for Collection<T> {}

impl<T: Item> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &T::KIND)
            .field("count", &self.count)
            .field("policy", &self.policy())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl<T: Item> TryFrom<Vec<u8>> for Collection<T> {
    type Error = eyre::Report;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}
