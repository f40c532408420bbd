//! Intervals attributed to an originator tag

use smallvec::SmallVec;
use std::fmt;

use super::{Interval, MergeResult, coalesce};
use crate::error::{Error, Result};

/// An inclusive `[start, end]` range carrying an opaque `tag`, typically the
/// id of the write that produced the data in that range.
///
/// Intervals with equal tags coalesce like [`SimpleInterval`]s. A newly
/// merged interval with a different tag overwrites whatever part of the
/// existing interval it covers, splitting it when needed.
///
/// [`SimpleInterval`]: super::SimpleInterval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct TaggedInterval {
    start: i64,
    end: i64,
    tag: i64,
}

impl TaggedInterval {
    /// Create a new tagged interval.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`.
    pub fn new(start: i64, end: i64, tag: i64) -> Self {
        match Self::try_new(start, end, tag) {
            Ok(interval) => interval,
            Err(err) => panic!("{}", err),
        }
    }

    /// Create a new tagged interval, rejecting `end < start`
    pub fn try_new(start: i64, end: i64, tag: i64) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidInterval { start, end });
        }
        Ok(Self { start, end, tag })
    }

    /// The originator tag
    pub fn tag(&self) -> i64 {
        self.tag
    }
}

impl Interval for TaggedInterval {
    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> i64 {
        self.end
    }

    fn with_bounds(&self, start: i64, end: i64) -> Self {
        Self::new(start, end, self.tag)
    }

    fn merge(&self, other: &Self) -> MergeResult<Self> {
        if self.tag == other.tag {
            return coalesce(self, other);
        }

        //   tttttttttttt
        //       oooo
        // tttt  oooo  tttt
        let mut pieces: SmallVec<[Self; 3]> = SmallVec::new();
        if self.start < other.start {
            let leading_end = (other.start - 1).min(self.end);
            pieces.push(self.with_bounds(self.start, leading_end));
        }
        let other_index = pieces.len();
        pieces.push(*other);
        if self.end > other.end {
            let trailing_start = (other.end + 1).max(self.start);
            pieces.push(self.with_bounds(trailing_start, self.end));
        }
        MergeResult::new(pieces, other_index)
    }
}

impl fmt::Display for TaggedInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] tag {}", self.start, self.end, self.tag)
    }
}
