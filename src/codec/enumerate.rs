//! # Lazy Enumeration
//!
//! Iterators over a borrowed buffer that decode one item per step. They are
//! `Clone`, so a traversal can be restarted from any point by cloning the
//! iterator, or from the beginning by asking the buffer for a new one.
//!
//! Each step yields a `Result`: a corrupt item ends the traversal after its
//! error is reported.
//!
//! [`Odometer`] walks the coordinates of a rectangular block in row-major
//! order, last axis fastest. Consecutive coordinates therefore map to
//! strictly increasing flat indices, which lets [`EnumerateDim`] advance a
//! single forward [`Cursor`] through a length-prefixed body.

use crate::codec::body::{Body, Cursor};
use crate::codec::item::Item;
use eyre::Result;
use smallvec::SmallVec;
use std::marker::PhantomData;
use std::ops::Range;

/// A dimension-index vector, one coordinate per axis.
pub type DimIndex = SmallVec<[usize; 4]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Odometer {
    starts: DimIndex,
    counts: DimIndex,
    offsets: DimIndex,
    done: bool,
}

impl Odometer {
    pub fn new(starts: &[usize], counts: &[usize]) -> Self {
        Self {
            starts: starts.iter().copied().collect(),
            counts: counts.iter().copied().collect(),
            offsets: counts.iter().map(|_| 0).collect(),
            done: counts.is_empty() || counts.contains(&0),
        }
    }
}

impl Iterator for Odometer {
    type Item = DimIndex;

    fn next(&mut self) -> Option<DimIndex> {
        if self.done {
            return None;
        }
        let coords = self
            .starts
            .iter()
            .zip(&self.offsets)
            .map(|(s, o)| s + o)
            .collect();

        self.done = true;
        for axis in (0..self.counts.len()).rev() {
            self.offsets[axis] += 1;
            if self.offsets[axis] < self.counts[axis] {
                self.done = false;
                break;
            }
            self.offsets[axis] = 0;
        }
        Some(coords)
    }
}

pub(crate) fn flat_of(coords: &[usize], strides: &[usize]) -> usize {
    coords.iter().zip(strides).map(|(c, s)| c * s).sum()
}

/// Items `range` of a collection or the flat items of a regular array,
/// paired with their absolute position.
#[derive(Debug, Clone)]
pub struct Enumerate<'a, T: Item> {
    body: Body<'a>,
    cursor: Cursor,
    end: usize,
    _item: PhantomData<T>,
}

impl<'a, T: Item> Enumerate<'a, T> {
    pub(crate) fn new(body: Body<'a>, range: Range<usize>) -> Result<Self> {
        Ok(Self {
            cursor: body.cursor_at(range.start)?,
            body,
            end: range.end,
            _item: PhantomData,
        })
    }
}

impl<T: Item> Iterator for Enumerate<'_, T> {
    type Item = Result<(usize, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.index >= self.end {
            return None;
        }
        let index = self.cursor.index;
        match self.body.read::<T>(&mut self.cursor) {
            Ok(value) => Some(Ok((index, value))),
            Err(e) => {
                self.end = index;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.cursor.index);
        (remaining, Some(remaining))
    }
}

/// Items of a rectangular block of a regular array, paired with their
/// dimension-index vector.
#[derive(Debug, Clone)]
pub struct EnumerateDim<'a, T: Item> {
    body: Body<'a>,
    cursor: Cursor,
    strides: DimIndex,
    odometer: Odometer,
    _item: PhantomData<T>,
}

impl<'a, T: Item> EnumerateDim<'a, T> {
    pub(crate) fn new(body: Body<'a>, strides: DimIndex, starts: &[usize], counts: &[usize]) -> Self {
        Self {
            body,
            cursor: Cursor::default(),
            strides,
            odometer: Odometer::new(starts, counts),
            _item: PhantomData,
        }
    }

    fn read_at(&mut self, coords: &[usize]) -> Result<T> {
        let flat = flat_of(coords, &self.strides);
        self.body.seek(&mut self.cursor, flat)?;
        self.body.read(&mut self.cursor)
    }
}

impl<T: Item> Iterator for EnumerateDim<'_, T> {
    type Item = Result<(DimIndex, T)>;

    fn next(&mut self) -> Option<Self::Item> {
        let coords = self.odometer.next()?;
        match self.read_at(&coords) {
            Ok(value) => Some(Ok((coords, value))),
            Err(e) => {
                self.odometer.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odometer_runs_last_axis_fastest() {
        let coords: Vec<Vec<usize>> = Odometer::new(&[1, 0], &[2, 3])
            .map(|c| c.to_vec())
            .collect();
        assert_eq!(
            coords,
            vec![
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
                vec![2, 0],
                vec![2, 1],
                vec![2, 2]
            ]
        );
    }

    #[test]
    fn odometer_with_empty_axis_yields_nothing() {
        assert_eq!(Odometer::new(&[0, 0], &[3, 0]).count(), 0);
    }

    #[test]
    fn flat_of_uses_strides() {
        assert_eq!(flat_of(&[1, 2], &[3, 1]), 5);
        assert_eq!(flat_of(&[1, 0, 2], &[12, 4, 1]), 14);
    }
}
