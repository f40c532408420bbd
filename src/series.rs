//! Gapped time series assembled from sparse writes
//!
//! A [`SeriesBuffer`] covers the cadences `[start, end]`. Writes land in a
//! dense payload while the covered cadences are collected as runs; `flush`
//! folds those runs into a valid-cadence set and an originator set and
//! returns an immutable [`Series`] snapshot. Cadences nobody wrote read as
//! `T::default()` and are reported as gaps.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use crate::compare::by_overlap;
use crate::error::{Error, Result};
use crate::factory::{SimpleFactory, TaggedFactory};
use crate::interval::{Interval, SimpleInterval, TaggedInterval};
use crate::set::{SimpleIntervalSet, TaggedIntervalSet};

/// Accumulates writes for one series
#[derive(Debug)]
pub struct SeriesBuffer<T> {
    start: i64,
    end: i64,
    values: Vec<T>,
    valid: SimpleIntervalSet,
    originators: TaggedIntervalSet,
    pending: BTreeMap<i64, i64>,
}

impl<T: Copy + Default> SeriesBuffer<T> {
    /// Create an empty buffer over the cadences `[start, end]`.
    ///
    /// Returns [`Error::InvalidInterval`] if `end < start` and
    /// [`Error::ConfigError`] if the payload cannot be allocated.
    pub fn new(
        start: i64,
        end: i64,
        simple: SimpleFactory,
        tagged: TaggedFactory,
    ) -> Result<Self> {
        let bounds = SimpleInterval::try_new(start, end)?;
        let too_long =
            || Error::ConfigError(format!("series [{}, {}] is too long to buffer", start, end));
        let len = usize::try_from(bounds.len()).map_err(|_| too_long())?;
        let mut values = Vec::new();
        values.try_reserve_exact(len).map_err(|_| too_long())?;
        values.resize(len, T::default());
        Ok(Self {
            start,
            end,
            values,
            valid: SimpleIntervalSet::new(simple),
            originators: TaggedIntervalSet::new(tagged),
            pending: BTreeMap::new(),
        })
    }

    /// First cadence of the buffer
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Last cadence of the buffer
    pub fn end(&self) -> i64 {
        self.end
    }

    fn offset(&self, index: i64) -> Result<usize> {
        if index < self.start || index > self.end {
            return Err(Error::OutOfRange {
                index,
                start: self.start,
                end: self.end,
            });
        }
        Ok(index.abs_diff(self.start) as usize)
    }

    /// Record `value` at cadence `index`, written by `originator`.
    /// A later write to the same cadence replaces the earlier one.
    pub fn add_value(&mut self, index: i64, value: T, originator: i64) -> Result<()> {
        let offset = self.offset(index)?;
        self.values[offset] = value;
        self.pending.insert(index, originator);
        Ok(())
    }

    /// Forget every value in `[start, end]`, flushed or not
    pub fn delete_range(&mut self, start: i64, end: i64) -> Result<()> {
        let first = self.offset(start)?;
        let last = self.offset(end)?;
        if last < first {
            return Err(Error::InvalidInterval { start, end });
        }
        self.values[first..=last].fill(T::default());
        let doomed: Vec<i64> = self.pending.range(start..=end).map(|(i, _)| *i).collect();
        for index in doomed {
            self.pending.remove(&index);
        }
        self.valid.delete_interval(&SimpleInterval::new(start, end));
        self.originators.delete_interval(&TaggedInterval::new(start, end, 0));
        Ok(())
    }

    /// Fold pending writes into the interval sets and snapshot the series
    pub fn flush(&mut self) -> Series<T> {
        let pending = std::mem::take(&mut self.pending);
        let mut runs = 0usize;
        let mut iter = pending.into_iter();
        if let Some((first, originator)) = iter.next() {
            let mut run = TaggedInterval::new(first, first, originator);
            for (index, originator) in iter {
                if index == run.end() + 1 && originator == run.tag() {
                    run = run.with_bounds(run.start(), index);
                    continue;
                }
                self.commit(run);
                runs += 1;
                run = TaggedInterval::new(index, index, originator);
            }
            self.commit(run);
            runs += 1;
        }
        debug!(runs, valid = self.valid.len(), "flushed series buffer");

        Series {
            start: self.start,
            end: self.end,
            values: Arc::from(self.values.as_slice()),
            valid: self.valid.intervals(),
            originators: self.originators.intervals(),
        }
    }

    fn commit(&mut self, run: TaggedInterval) {
        self.valid.merge_interval(SimpleInterval::new(run.start(), run.end()));
        self.originators.merge_interval(run);
    }
}

/// Immutable snapshot of a flushed series
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T> {
    start: i64,
    end: i64,
    values: Arc<[T]>,
    valid: Arc<[SimpleInterval]>,
    originators: Arc<[TaggedInterval]>,
}

impl<T> Series<T> {
    /// First cadence
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Last cadence
    pub fn end(&self) -> i64 {
        self.end
    }

    /// Number of cadences, gaps included
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; a series covers at least one cadence
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Payload indexed from `start`; gaps hold `T::default()`
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Cadences that hold written data
    pub fn valid_cadences(&self) -> Arc<[SimpleInterval]> {
        Arc::clone(&self.valid)
    }

    /// Which originator wrote each valid run
    pub fn originators(&self) -> Arc<[TaggedInterval]> {
        Arc::clone(&self.originators)
    }

    /// Whether cadence `index` holds written data
    pub fn is_valid(&self, index: i64) -> bool {
        let target = SimpleInterval::new(index, index);
        self.valid.binary_search_by(|p| by_overlap(p, &target)).is_ok()
    }

    /// One flag per cadence, `true` where the cadence is a gap
    pub fn gap_indicators(&self) -> Vec<bool> {
        let mut gaps = vec![true; self.values.len()];
        for interval in self.valid.iter() {
            let first = interval.start().abs_diff(self.start) as usize;
            let last = interval.end().abs_diff(self.start) as usize;
            gaps[first..=last].fill(false);
        }
        gaps
    }

    /// Offsets from `start` of every gap cadence
    pub fn gap_indices(&self) -> Vec<usize> {
        self.gap_indicators()
            .into_iter()
            .enumerate()
            .filter_map(|(offset, gap)| gap.then_some(offset))
            .collect()
    }

    /// Originator of the data at cadence `index`, or `None` for a gap
    pub fn originator_at(&self, index: i64) -> Option<i64> {
        let target = TaggedInterval::new(index, index, 0);
        self.originators
            .binary_search_by(|p| by_overlap(p, &target))
            .ok()
            .map(|found| self.originators[found].tag())
    }

    /// Every originator contributing to the series
    pub fn unique_originators(&self) -> BTreeSet<i64> {
        self.originators.iter().map(|i| i.tag()).collect()
    }
}
