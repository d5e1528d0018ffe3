//! # Collection and Regular Array Codecs
//!
//! Two self-describing buffer types share one header preamble, one item
//! codec and one body layer:
//!
//! ```text
//! Collection<T>:    [preamble][count]             [body: count items]
//! RegularArray<T>:  [preamble][rank][d0]..[dR-1]  [body: d0*..*dR-1 items]
//! ```
//!
//! Shape fields use the count sizing picked by the [`Policy`]. The body
//! layout depends on the kind only (see `body`), so a collection and a
//! rank-1 array with the same policy and items have byte-identical bodies,
//! and `to_array`/`to_collection` just rewrite the shape fields.
//!
//! ## Value Semantics
//!
//! Buffers are immutable values. Every editing operation takes `&self` and
//! returns a new buffer, leaving the input untouched even when it fails.
//! Both types are `Send + Sync` and can be read from any number of threads.
//!
//! ## Addressing
//!
//! | Operation | Fixed-width / Boolean | Text / Raw |
//! |-----------|-----------------------|------------|
//! | count, rank, extents | O(1) | O(1) |
//! | get | O(1) | O(index) |
//! | set, insert, remove | O(n) copy | O(n) copy |
//! | enumerate | O(n) | O(n) |
//!
//! Regular arrays address items by flat row-major index or by a
//! dimension-index vector. With `stride[R-1] = 1` and
//! `stride[i] = stride[i+1] * d[i+1]`, the flat index of `(i0..iR-1)` is
//! `sum(ik * stride[k])`.
//!
//! ## Usage Example
//!
//! ```rust
//! use binarray::{Collection, Policy, RegularArray, SizeEncoding};
//!
//! let policy = Policy::new(SizeEncoding::One).with_compact(true);
//! let mut coll = Collection::<i32>::new(policy).unwrap();
//! for _ in 0..3 {
//!     coll = coll.insert(None, &5).unwrap();
//! }
//! assert_eq!(coll.format().unwrap(), "5,5,5");
//! assert_eq!(coll.item_width(), Some(1));
//!
//! let grid = RegularArray::<bool>::new(&[2, 3], Policy::new(SizeEncoding::One)).unwrap();
//! let grid = grid.set_dim(&[1, 2], &true).unwrap();
//! assert!(grid.get_flat(5).unwrap());
//! ```

mod body;
mod collection;
mod enumerate;
mod header;
pub mod item;
mod regular;

#[cfg(test)]
mod tests;

pub use collection::Collection;
pub use enumerate::{DimIndex, Enumerate, EnumerateDim};
pub use header::Policy;
pub use item::Item;
pub use regular::{DimRange, RegularArray};

use crate::error::CodecError;
use eyre::{ensure, Result};
use std::ops::Range;

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    ensure!(index < len, CodecError::IndexOutOfRange { index, len });
    Ok(())
}

/// Resolves an optional `(start, count)` pair against `len`. `start`
/// defaults to 0 and `count` to everything after `start`.
pub(crate) fn resolve_range(
    start: Option<usize>,
    count: Option<usize>,
    len: usize,
) -> Result<Range<usize>> {
    let start = start.unwrap_or(0);
    let count = count.unwrap_or_else(|| len.saturating_sub(start));
    ensure!(
        start.checked_add(count).is_some_and(|end| end <= len),
        CodecError::RangeOutOfBounds { start, count, len }
    );
    Ok(start..start + count)
}

/// Resolves an insertion point; `None` appends.
pub(crate) fn resolve_insert(index: Option<usize>, len: usize) -> Result<usize> {
    let index = index.unwrap_or(len);
    ensure!(index <= len, CodecError::IndexOutOfRange { index, len });
    Ok(index)
}

/// `count` copies of `value`. An allocation the system refuses is an
/// `EncodingOverflow` on the count rather than an abort.
pub(crate) fn repeated<T: Clone>(value: &T, count: usize) -> Result<Vec<T>> {
    let mut items = Vec::new();
    items.try_reserve_exact(count).map_err(|_| {
        eyre::Report::new(CodecError::EncodingOverflow {
            value: count as u128,
            width: std::mem::size_of::<usize>(),
        })
    })?;
    items.resize(count, value.clone());
    Ok(items)
}
