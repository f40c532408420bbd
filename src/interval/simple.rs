//! Plain inclusive intervals

use std::fmt;

use super::{Interval, MergeResult, coalesce};
use crate::error::{Error, Result};

/// An inclusive `[start, end]` range that coalesces with any interval it
/// overlaps or touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleInterval {
    start: i64,
    end: i64,
}

impl SimpleInterval {
    /// Create a new interval.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`. Use [`SimpleInterval::try_new`] for
    /// untrusted bounds.
    pub fn new(start: i64, end: i64) -> Self {
        match Self::try_new(start, end) {
            Ok(interval) => interval,
            Err(err) => panic!("{}", err),
        }
    }

    /// Create a new interval, rejecting `end < start`
    pub fn try_new(start: i64, end: i64) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }
}

impl Interval for SimpleInterval {
    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> i64 {
        self.end
    }

    fn with_bounds(&self, start: i64, end: i64) -> Self {
        Self::new(start, end)
    }

    fn merge(&self, other: &Self) -> MergeResult<Self> {
        coalesce(self, other)
    }
}

impl fmt::Display for SimpleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
