//! # Regular Array Codec
//!
//! A fixed-rank rectangular array stored in row-major order:
//!
//! ```text
//! +----------+------+------+-----+---------+------------------------+
//! | preamble | rank | d0   | ... | d(R-1)  | body (d0*..*dR-1 items)|
//! +----------+------+------+-----+---------+------------------------+
//!              all in the count sizing
//! ```
//!
//! The shape is fixed at creation: no operation changes the rank or an
//! extent. A zero extent is allowed and leaves the body empty.
//!
//! ## Addressing
//!
//! ```text
//! dims    = [2, 3]
//! strides = [3, 1]
//!
//!            axis 1 →
//!          ┌────┬────┬────┐
//! axis 0 ↓ │ 0  │ 1  │ 2  │   (0, j) → j
//!          ├────┼────┼────┤
//!          │ 3  │ 4  │ 5  │   (1, j) → 3 + j
//!          └────┴────┴────┘
//! ```
//!
//! Dimensional operations convert to flat indices through the stride vector
//! and then reuse the flat code paths. Block operations (`*_dim_range`)
//! visit the Cartesian product of the per-axis ranges with the last axis
//! innermost, so flat positions are visited in increasing order.

use crate::codec::body::{encode_body, overwrite, splice, validate_items, Body, Layout};
use crate::codec::collection::Collection;
use crate::codec::enumerate::{flat_of, DimIndex, Enumerate, EnumerateDim, Odometer};
use crate::codec::header::{Policy, Preamble};
use crate::codec::item::Item;
use crate::codec::{check_index, repeated, resolve_range};
use crate::config::{CodecConfig, CLOSE_BRACKET, MAX_RANK, OPEN_BRACKET};
use crate::encoding::sizing::decode_len;
use crate::encoding::write_size;
use crate::error::CodecError;
use crate::parsing::text::{self, Node};
use crate::types::{Codepage, PrimitiveKind};
use eyre::{ensure, Result};
use smallvec::SmallVec;
use std::fmt;
use std::marker::PhantomData;
use tracing::trace;

/// A `(start, count)` range along one axis; `count: None` runs to the end
/// of the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DimRange {
    pub start: usize,
    pub count: Option<usize>,
}

impl DimRange {
    pub fn new(start: usize, count: usize) -> Self {
        Self {
            start,
            count: Some(count),
        }
    }

    pub fn starting_at(start: usize) -> Self {
        Self { start, count: None }
    }

    /// The whole axis.
    pub fn full() -> Self {
        Self::default()
    }
}

fn check_rank(rank: usize) -> Result<()> {
    ensure!(
        (1..=MAX_RANK).contains(&rank),
        CodecError::InvalidRank {
            rank,
            max: MAX_RANK,
        }
    );
    Ok(())
}

/// Product of the extents; a zero extent wins over any overflow.
fn product(dims: &[usize]) -> Option<usize> {
    if dims.contains(&0) {
        return Some(0);
    }
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Row-major strides. Strides of an empty array saturate; no coordinate
/// check passes on such an array, so they are never applied.
fn strides_of(dims: &[usize]) -> DimIndex {
    let mut strides: DimIndex = SmallVec::from_elem(1, dims.len());
    for axis in (0..dims.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1].saturating_mul(dims[axis + 1]);
    }
    strides
}

#[derive(Clone)]
pub struct RegularArray<T: Item> {
    bytes: Vec<u8>,
    pre: Preamble,
    dims: DimIndex,
    flat_len: usize,
    _item: PhantomData<T>,
}

impl<T: Item> RegularArray<T> {
    /// Creates an array of shape `dims` filled with `T::default()`.
    pub fn new(dims: &[usize], policy: Policy) -> Result<Self> {
        Self::with_config(dims, policy, &CodecConfig::default())
    }

    pub fn with_config(dims: &[usize], policy: Policy, config: &CodecConfig) -> Result<Self> {
        check_rank(dims.len())?;
        let flat = Self::checked_flat_len(dims)?;
        let values = repeated(&T::default(), flat)?;
        Self::from_shape_values_with_config(dims, &values, policy, config)
    }

    pub fn from_shape_values(dims: &[usize], values: &[T], policy: Policy) -> Result<Self> {
        Self::from_shape_values_with_config(dims, values, policy, &CodecConfig::default())
    }

    /// Builds an array from `values` in row-major order.
    pub fn from_shape_values_with_config(
        dims: &[usize],
        values: &[T],
        policy: Policy,
        config: &CodecConfig,
    ) -> Result<Self> {
        let array = Self::from_parts(Preamble::resolve::<T>(&policy, config), dims, values)?;
        trace!(kind = %T::KIND, dims = ?array.dims.as_slice(), "regular array built");
        Ok(array)
    }

    fn checked_flat_len(dims: &[usize]) -> Result<usize> {
        product(dims).ok_or_else(|| {
            eyre::Report::new(CodecError::EncodingOverflow {
                value: dims
                    .iter()
                    .try_fold(1u128, |acc, &d| acc.checked_mul(d as u128))
                    .unwrap_or(u128::MAX),
                width: std::mem::size_of::<usize>(),
            })
        })
    }

    pub(crate) fn from_parts(pre: Preamble, dims: &[usize], values: &[T]) -> Result<Self> {
        check_rank(dims.len())?;
        let flat = Self::checked_flat_len(dims)?;
        ensure!(
            values.len() == flat,
            CodecError::DimensionMismatch {
                expected: flat,
                actual: values.len(),
            }
        );
        let (pre, body) = encode_body(pre, values)?;
        Self::assemble(pre, dims, &body)
    }

    pub(crate) fn assemble(pre: Preamble, dims: &[usize], body: &[u8]) -> Result<Self> {
        check_rank(dims.len())?;
        let flat_len = Self::checked_flat_len(dims)?;
        let width = pre.count_sizing.width();
        let mut bytes =
            Vec::with_capacity(pre.encoded_len() + (dims.len() + 1) * width + body.len());
        pre.write(&mut bytes);
        write_size(dims.len(), pre.count_sizing, &mut bytes)?;
        for &d in dims {
            write_size(d, pre.count_sizing, &mut bytes)?;
        }
        bytes.extend_from_slice(body);
        Ok(Self {
            bytes,
            pre,
            dims: dims.iter().copied().collect(),
            flat_len,
            _item: PhantomData,
        })
    }

    /// Opens a buffer produced elsewhere, validating it completely.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let pre = Preamble::read::<T>(&bytes)?;
        let sizing = pre.count_sizing;
        let mut offset = pre.encoded_len();
        let rank = decode_len(&bytes, sizing, offset)?;
        ensure!(
            (1..=MAX_RANK).contains(&rank),
            CodecError::malformed(format!("rank {} outside 1..={}", rank, MAX_RANK))
        );
        offset += sizing.width();

        let mut dims = DimIndex::new();
        for _ in 0..rank {
            dims.push(decode_len(&bytes, sizing, offset)?);
            offset += sizing.width();
        }
        let flat_len = product(&dims).ok_or_else(|| {
            eyre::Report::new(CodecError::malformed(format!(
                "shape {:?} overflows the address space",
                dims.as_slice()
            )))
        })?;

        let body = Body::open(&bytes[offset..], pre.layout(), pre.codepage, flat_len)?;
        validate_items::<T>(&pre, &body)?;
        Ok(Self {
            bytes,
            pre,
            dims,
            flat_len,
            _item: PhantomData,
        })
    }

    /// Parses a nested literal such as `[[1,2],[3,4]]` or `<2,0>[[],[]]`.
    pub fn parse(text: &str, policy: Policy) -> Result<Self> {
        Self::parse_with_config(text, policy, &CodecConfig::default())
    }

    pub fn parse_with_config(text: &str, policy: Policy, config: &CodecConfig) -> Result<Self> {
        let nested = text::parse_nested(text)?;
        let dims = match nested.shape {
            Some(shape) => shape,
            None => text::infer_shape(&nested.root),
        };
        // an empty array may spell its body as a bare `[]` after the shape
        let tokens = match (&nested.root, product(&dims)) {
            (Node::List(children), Some(0)) if children.is_empty() => Vec::new(),
            _ => text::flatten(&nested.root, &dims)?,
        };
        let values = tokens
            .iter()
            .map(|token| T::parse_literal(&token.text, token.quoted))
            .collect::<Result<Vec<_>>>()?;
        trace!(kind = %T::KIND, dims = ?dims.as_slice(), "regular array parsed");
        Self::from_shape_values_with_config(&dims, &values, policy, config)
    }

    pub fn format(&self) -> Result<String> {
        let mut out = String::new();
        if self.flat_len == 0 {
            text::write_shape(&mut out, &self.dims);
            out.push(OPEN_BRACKET);
            out.push(CLOSE_BRACKET);
            return Ok(out);
        }
        let items = self.to_vec()?;
        text::write_nested(&mut out, &self.dims, &items, &mut |item: &T, out: &mut String| {
            item.format_literal(out)
        });
        Ok(out)
    }

    fn body_start(&self) -> usize {
        self.pre.encoded_len() + (self.dims.len() + 1) * self.pre.count_sizing.width()
    }

    fn body(&self) -> Body<'_> {
        Body::new(
            &self.bytes[self.body_start()..],
            self.pre.layout(),
            self.pre.codepage,
            self.flat_len,
        )
    }

    fn rebuilt(&self, (pre, body): (Preamble, Vec<u8>)) -> Result<Self> {
        Self::assemble(pre, &self.dims, &body)
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn flat_length(&self) -> usize {
        self.flat_len
    }

    pub fn dim_lengths(&self) -> &[usize] {
        &self.dims
    }

    pub fn dim_length(&self, axis: usize) -> Result<usize> {
        check_index(axis, self.dims.len())?;
        Ok(self.dims[axis])
    }

    pub fn strides(&self) -> DimIndex {
        strides_of(&self.dims)
    }

    pub fn kind(&self) -> PrimitiveKind {
        T::KIND
    }

    pub fn policy(&self) -> Policy {
        self.pre.policy()
    }

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

    /// Flat index of a dimension-index vector.
    pub fn flat_index_of(&self, indices: &[usize]) -> Result<usize> {
        ensure!(
            indices.len() == self.dims.len(),
            CodecError::DimensionMismatch {
                expected: self.dims.len(),
                actual: indices.len(),
            }
        );
        for (&index, &len) in indices.iter().zip(&self.dims) {
            check_index(index, len)?;
        }
        Ok(flat_of(indices, &self.strides()))
    }

    /// Dimension-index vector of a flat index.
    pub fn dim_index_of(&self, flat: usize) -> Result<DimIndex> {
        check_index(flat, self.flat_len)?;
        let mut rest = flat;
        Ok(self
            .strides()
            .iter()
            .map(|&stride| {
                let coord = rest / stride;
                rest %= stride;
                coord
            })
            .collect())
    }

    pub fn get_flat(&self, index: usize) -> Result<T> {
        self.body().get(index)
    }

    pub fn set_flat(&self, index: usize, value: &T) -> Result<Self> {
        check_index(index, self.flat_len)?;
        self.rebuilt(splice(
            self.pre,
            &self.body(),
            index,
            1,
            std::slice::from_ref(value),
        )?)
    }

    pub fn get_dim(&self, indices: &[usize]) -> Result<T> {
        self.get_flat(self.flat_index_of(indices)?)
    }

    pub fn set_dim(&self, indices: &[usize], value: &T) -> Result<Self> {
        self.set_flat(self.flat_index_of(indices)?, value)
    }

    /// First flat position holding `value`.
    pub fn index_of(&self, value: &T) -> Result<Option<usize>> {
        self.body().position(value, 0..self.flat_len, false)
    }

    pub fn contains(&self, value: &T) -> Result<bool> {
        Ok(self.index_of(value)?.is_some())
    }

    /// Items `index .. index + count` in flat order, as a collection with
    /// this array's policy.
    pub fn get_flat_range(&self, index: Option<usize>, count: Option<usize>) -> Result<Collection<T>> {
        let range = resolve_range(index, count, self.flat_len)?;
        let items = self.body().decode_range(range.start, range.len())?;
        Collection::from_parts(self.pre, &items)
    }

    pub fn set_flat_range(&self, index: usize, range: &Collection<T>) -> Result<Self> {
        let items = range.to_vec()?;
        resolve_range(Some(index), Some(items.len()), self.flat_len)?;
        self.rebuilt(splice(self.pre, &self.body(), index, items.len(), &items)?)
    }

    pub fn fill_flat_range(&self, index: Option<usize>, count: Option<usize>, value: &T) -> Result<Self> {
        let range = resolve_range(index, count, self.flat_len)?;
        let fill = repeated(value, range.len())?;
        self.rebuilt(splice(self.pre, &self.body(), range.start, range.len(), &fill)?)
    }

    fn resolve_dim_ranges(&self, ranges: &[DimRange]) -> Result<(DimIndex, DimIndex)> {
        ensure!(
            ranges.len() == self.dims.len(),
            CodecError::DimensionMismatch {
                expected: self.dims.len(),
                actual: ranges.len(),
            }
        );
        let mut starts = DimIndex::new();
        let mut counts = DimIndex::new();
        for (range, &len) in ranges.iter().zip(&self.dims) {
            let resolved = resolve_range(Some(range.start), range.count, len)?;
            starts.push(resolved.start);
            counts.push(resolved.len());
        }
        Ok((starts, counts))
    }

    /// The block selected by `ranges`, as an array of the same rank whose
    /// extents are the per-axis counts.
    pub fn get_dim_range(&self, ranges: &[DimRange]) -> Result<Self> {
        let (starts, counts) = self.resolve_dim_ranges(ranges)?;
        let items = EnumerateDim::<T>::new(self.body(), self.strides(), &starts, &counts)
            .map(|item| item.map(|(_, value)| value))
            .collect::<Result<Vec<_>>>()?;
        Self::from_parts(self.pre, &counts, &items)
    }

    /// Writes `block` with its origin at `starts`.
    pub fn set_dim_range(&self, starts: &[usize], block: &RegularArray<T>) -> Result<Self> {
        ensure!(
            starts.len() == self.dims.len(),
            CodecError::DimensionMismatch {
                expected: self.dims.len(),
                actual: starts.len(),
            }
        );
        ensure!(
            block.rank() == self.dims.len(),
            CodecError::DimensionMismatch {
                expected: self.dims.len(),
                actual: block.rank(),
            }
        );
        for ((&start, &count), &len) in starts.iter().zip(block.dim_lengths()).zip(&self.dims) {
            resolve_range(Some(start), Some(count), len)?;
        }

        let values = block.to_vec()?;
        let strides = self.strides();
        let flats = Odometer::new(starts, block.dim_lengths()).map(|coords| flat_of(&coords, &strides));
        self.rebuilt(overwrite(self.pre, &self.body(), flats.zip(&values))?)
    }

    pub fn fill_dim_range(&self, ranges: &[DimRange], value: &T) -> Result<Self> {
        let (starts, counts) = self.resolve_dim_ranges(ranges)?;
        let strides = self.strides();
        let flats = Odometer::new(&starts, &counts).map(|coords| flat_of(&coords, &strides));
        self.rebuilt(overwrite(
            self.pre,
            &self.body(),
            flats.map(|flat| (flat, value)),
        )?)
    }

    pub fn enumerate_flat(&self, index: Option<usize>, count: Option<usize>) -> Result<Enumerate<'_, T>> {
        let range = resolve_range(index, count, self.flat_len)?;
        Enumerate::new(self.body(), range)
    }

    pub fn enumerate_dim(&self, ranges: &[DimRange]) -> Result<EnumerateDim<'_, T>> {
        let (starts, counts) = self.resolve_dim_ranges(ranges)?;
        Ok(EnumerateDim::new(self.body(), self.strides(), &starts, &counts))
    }

    /// Flattens to a collection in row-major order with the same policy.
    pub fn to_collection(&self) -> Result<Collection<T>> {
        Collection::assemble(self.pre, self.flat_len, self.body().bytes())
    }
}

impl<T: Item> PartialEq for RegularArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<T: Item> Eq for RegularArray<T> {}

impl<T: Item> fmt::Debug for RegularArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegularArray")
            .field("kind", &T::KIND)
            .field("dims", &self.dims.as_slice())
            .field("policy", &self.policy())
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl<T: Item> TryFrom<Vec<u8>> for RegularArray<T> {
    type Error = eyre::Report;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SizeEncoding;
    use crate::error::codec_error;

    fn grid() -> RegularArray<i16> {
        let values: Vec<i16> = (0..12).collect();
        RegularArray::from_shape_values(&[3, 4], &values, Policy::new(SizeEncoding::One)).unwrap()
    }

    #[test]
    fn header_layout() {
        let array = RegularArray::<u8>::new(&[2, 3], Policy::new(SizeEncoding::One)).unwrap();
        assert_eq!(&array.as_bytes()[..5], &[1, 0, 2, 2, 3]);
        assert_eq!(array.as_bytes().len(), 5 + 6);
    }

    #[test]
    fn strides_and_index_conversion() {
        let array = RegularArray::<bool>::new(&[2, 3, 4], Policy::default()).unwrap();
        assert_eq!(array.strides().as_slice(), &[12, 4, 1]);
        assert_eq!(array.flat_index_of(&[1, 0, 2]).unwrap(), 14);
        assert_eq!(array.dim_index_of(14).unwrap().as_slice(), &[1, 0, 2]);
    }

    #[test]
    fn invalid_rank_and_shape_errors() {
        let err = RegularArray::<u8>::new(&[], Policy::default()).unwrap_err();
        assert_eq!(
            codec_error(&err),
            Some(&CodecError::InvalidRank { rank: 0, max: MAX_RANK })
        );

        let err = RegularArray::<u8>::new(&[256], Policy::new(SizeEncoding::One)).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::EncodingOverflow { .. })));

        let err = RegularArray::<u8>::new(&[usize::MAX, 2], Policy::new(SizeEncoding::Eight))
            .unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::EncodingOverflow { .. })));

        let err = RegularArray::from_shape_values(&[2], &[1u8], Policy::default()).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::DimensionMismatch { .. })));
    }

    #[test]
    fn dim_addressing_errors() {
        let array = grid();
        let err = array.get_dim(&[1]).unwrap_err();
        assert_eq!(
            codec_error(&err),
            Some(&CodecError::DimensionMismatch { expected: 2, actual: 1 })
        );
        let err = array.get_dim(&[1, 4]).unwrap_err();
        assert_eq!(
            codec_error(&err),
            Some(&CodecError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert!(array.dim_length(2).is_err());
    }

    #[test]
    fn get_dim_range_extracts_block() {
        let block = grid()
            .get_dim_range(&[DimRange::new(1, 2), DimRange::new(1, 2)])
            .unwrap();
        assert_eq!(block.dim_lengths(), &[2, 2]);
        assert_eq!(block.to_vec().unwrap(), vec![5, 6, 9, 10]);

        let tail = grid()
            .get_dim_range(&[DimRange::starting_at(2), DimRange::full()])
            .unwrap();
        assert_eq!(tail.to_vec().unwrap(), vec![8, 9, 10, 11]);
    }

    #[test]
    fn set_and_fill_dim_range() {
        let patch =
            RegularArray::from_shape_values(&[2, 1], &[-1i16, -2], Policy::default()).unwrap();
        let array = grid().set_dim_range(&[1, 3], &patch).unwrap();
        assert_eq!(array.get_dim(&[1, 3]).unwrap(), -1);
        assert_eq!(array.get_dim(&[2, 3]).unwrap(), -2);
        assert_eq!(array.get_dim(&[0, 3]).unwrap(), 3);

        let err = grid().set_dim_range(&[2, 3], &patch).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::RangeOutOfBounds { .. })));

        let filled = grid()
            .fill_dim_range(&[DimRange::full(), DimRange::new(0, 1)], &0)
            .unwrap();
        assert_eq!(filled.to_vec().unwrap(), vec![0, 1, 2, 3, 0, 5, 6, 7, 0, 9, 10, 11]);
    }

    #[test]
    fn flat_ranges() {
        let array = grid();
        let run = array.get_flat_range(Some(10), None).unwrap();
        assert_eq!(run.to_vec().unwrap(), vec![10, 11]);

        let array = array.fill_flat_range(Some(2), Some(3), &7).unwrap();
        assert_eq!(&array.to_vec().unwrap()[..6], &[0, 1, 7, 7, 7, 5]);

        let err = array.set_flat_range(11, &run).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::RangeOutOfBounds { .. })));
    }

    #[test]
    fn text_block_writes_shift_later_items() {
        let values: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let array = RegularArray::from_shape_values(&[2, 2], &values, Policy::default()).unwrap();
        let array = array
            .fill_dim_range(&[DimRange::full(), DimRange::new(0, 1)], &"long".to_string())
            .unwrap();
        assert_eq!(array.to_vec().unwrap(), vec!["long", "b", "long", "d"]);
        assert_eq!(RegularArray::<String>::from_bytes(array.as_bytes().to_vec()).unwrap(), array);
    }

    #[test]
    fn from_bytes_rejects_zero_rank() {
        let err = RegularArray::<u8>::from_bytes(vec![1, 0, 0]).unwrap_err();
        assert!(matches!(codec_error(&err), Some(CodecError::MalformedBuffer(_))));
    }
}
