//! Interval value types
//!
//! An interval is an inclusive `[start, end]` range over `i64` indices with
//! `start <= end`. Intervals are values: every change produces a new one.
//! Two variants exist, plain [`SimpleInterval`]s that coalesce whenever they
//! touch, and [`TaggedInterval`]s that only coalesce with equal tags.

pub mod simple;
pub mod tagged;

pub use simple::SimpleInterval;
pub use tagged::TaggedInterval;

use smallvec::SmallVec;
use std::fmt;
use std::hash::Hash;

/// Capability shared by the interval variants stored in an [`IntervalSet`].
///
/// [`IntervalSet`]: crate::set::IntervalSet
pub trait Interval: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Inclusive first index
    fn start(&self) -> i64;

    /// Inclusive last index
    fn end(&self) -> i64;

    /// A copy of this interval, same variant and tag, with new bounds.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`.
    fn with_bounds(&self, start: i64, end: i64) -> Self;

    /// Combine `other` into this interval.
    ///
    /// The result lists the surviving pieces in ascending order and marks
    /// which of them carries `other`'s contribution.
    fn merge(&self, other: &Self) -> MergeResult<Self>;

    /// Number of indices covered
    fn len(&self) -> u64 {
        self.end().abs_diff(self.start()).saturating_add(1)
    }

    /// Whether `index` lies inside this interval
    fn contains(&self, index: i64) -> bool {
        index >= self.start() && index <= self.end()
    }

    /// Whether the two intervals share at least one index
    fn overlaps(&self, other: &Self) -> bool {
        !(other.end() < self.start() || other.start() > self.end())
    }
}

/// Plain coalescing merge used by the simple variant and by equal-tag
/// tagged intervals.
pub(crate) fn coalesce<I: Interval>(this: &I, other: &I) -> MergeResult<I> {
    if other.end().saturating_add(1) < this.start() {
        return MergeResult::new(smallvec::smallvec![other.clone(), this.clone()], 0);
    }
    if other.start().saturating_sub(1) > this.end() {
        return MergeResult::new(smallvec::smallvec![this.clone(), other.clone()], 1);
    }
    let merged = this.with_bounds(
        this.start().min(other.start()),
        this.end().max(other.end()),
    );
    MergeResult::new(smallvec::smallvec![merged], 0)
}

/// Outcome of [`Interval::merge`]: one to three ascending pieces and the
/// position of the piece that continues the merged-in interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult<I> {
    pieces: SmallVec<[I; 3]>,
    other_index: usize,
}

impl<I: Interval> MergeResult<I> {
    /// Build a merge result, checking that the pieces are non-empty,
    /// ascending and non-overlapping and that `other_index` points at one of
    /// them.
    ///
    /// # Panics
    ///
    /// A violation is an internal consistency failure and panics with the
    /// offending pieces in the message.
    pub fn new(pieces: SmallVec<[I; 3]>, other_index: usize) -> Self {
        if pieces.is_empty() || other_index >= pieces.len() {
            panic!(
                "merge produced no usable pieces: {:?}, other index {}",
                pieces.as_slice(),
                other_index
            );
        }
        if !crate::compare::check_overlap(&pieces) {
            panic!("merge produced overlapping pieces: {:?}", pieces.as_slice());
        }
        Self {
            pieces,
            other_index,
        }
    }

    /// All pieces in ascending order
    pub fn pieces(&self) -> &[I] {
        &self.pieces
    }

    /// Position of the piece carrying the merged-in interval
    pub fn other_index(&self) -> usize {
        self.other_index
    }

    /// The piece carrying the merged-in interval
    pub fn other(&self) -> &I {
        &self.pieces[self.other_index]
    }

    /// Whether nothing follows the merged-in piece
    pub fn other_is_last(&self) -> bool {
        self.other_index + 1 == self.pieces.len()
    }

    /// Consume the result, returning every piece
    pub fn into_pieces(self) -> SmallVec<[I; 3]> {
        self.pieces
    }

    /// Consume the result, separating the merged-in piece from the rest.
    /// The remaining pieces keep their relative order.
    pub fn split_other(mut self) -> (I, SmallVec<[I; 3]>) {
        let other = self.pieces.remove(self.other_index);
        (other, self.pieces)
    }
}
