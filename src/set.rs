//! Sorted, non-overlapping interval sets
//!
//! The backing sequence is an immutable `Arc<[I]>` snapshot. Every mutation
//! builds a new sequence, asks the factory for a canonical equal instance and
//! swaps the handle, so snapshots handed out by [`IntervalSet::intervals`]
//! never change underneath their holders.
//!
//! Complexity:
//!    - merge / delete: `O(n)` (copy of the snapshot) plus `O(log n)` search
//!    - spanned_intervals / in_interval_set: `O(log n + k)`
//!    - write_to / read_from: `O(n)`
//!
//! An `IntervalSet` has a single owner. Mutation takes `&mut self` and there
//! is no internal locking; wrap the set in a lock to share it between
//! threads. Only the factory's interning cache is shared.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use smallvec::SmallVec;
use std::fmt;
use std::fmt::Write as _;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::compare::{by_end, by_overlap, by_start, check_overlap};
use crate::error::{Error, Result};
use crate::factory::{IntervalFactory, SimpleFactory, TaggedFactory};
use crate::interval::Interval;

/// Magic bytes opening a versioned interval set
pub const FORMAT_MAGIC: [u8; 4] = *b"IVS1";

/// Current versioned format revision
pub const FORMAT_VERSION: u8 = 1;

/// Upper bound on up-front allocation when reading an untrusted count
const PREALLOCATE_LIMIT: usize = 4096;

/// Set of plain, coalescing intervals
pub type SimpleIntervalSet = IntervalSet<SimpleFactory>;

/// Set of originator-tagged intervals
pub type TaggedIntervalSet = IntervalSet<TaggedFactory>;

/// A collection of sorted, non-overlapping, inclusive intervals.
///
/// ## Invariants
///
/// 1.  **Sorted**: intervals ascend by start.
/// 2.  **Disjoint**: no two intervals share an index. Plain intervals that
///     touch are coalesced; tagged intervals may touch when their tags differ.
#[derive(Clone)]
pub struct IntervalSet<F: IntervalFactory> {
    factory: F,
    intervals: Arc<[F::Interval]>,
}

impl<F: IntervalFactory> IntervalSet<F> {
    /// Creates a new, empty set
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            intervals: Arc::from(Vec::new()),
        }
    }

    /// Creates a set from intervals already sorted by start.
    ///
    /// Returns [`Error::OverlappingIntervals`] if the input is out of order
    /// or overlaps.
    pub fn from_sorted(factory: F, init: Vec<F::Interval>) -> Result<Self> {
        if let Some(pair) = init.windows(2).find(|p| p[0].end() >= p[1].start()) {
            return Err(Error::OverlappingIntervals(format!(
                "{} is followed by {}",
                pair[0], pair[1]
            )));
        }
        let mut set = Self::new(factory);
        set.store(init);
        Ok(set)
    }

    /// Reads a set in the unversioned layout written by [`IntervalSet::write_to`]
    pub fn read<R: Read>(factory: F, input: &mut R) -> Result<Self> {
        let mut set = Self::new(factory);
        set.read_from(input)?;
        Ok(set)
    }

    /// The factory this set was built with
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Shared snapshot of every interval in ascending order
    pub fn intervals(&self) -> Arc<[F::Interval]> {
        Arc::clone(&self.intervals)
    }

    /// Borrow the current intervals
    pub fn as_slice(&self) -> &[F::Interval] {
        &self.intervals
    }

    /// Number of disjoint intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns `true` if the set contains no intervals
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Adopt `intervals` as the new snapshot, interned through the factory
    fn store(&mut self, intervals: Vec<F::Interval>) {
        debug_assert!(check_overlap(&intervals), "{}", render(&intervals));
        self.intervals = if intervals.is_empty() {
            Arc::from(intervals)
        } else {
            self.factory.cached_list(Arc::from(intervals))
        };
    }

    /// Insert an interval. This may add a new interval, extend existing
    /// ones, or (for tagged intervals) split the intervals it overwrites.
    pub fn merge_interval(&mut self, interval: F::Interval) {
        let mut intervals = self.intervals.to_vec();
        merge_into(&mut intervals, interval);
        self.store(intervals);
    }

    /// Merge every interval of `other` into this set, in ascending order.
    /// The result is interned once at the end.
    pub fn merge_set(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        let mut intervals = self.intervals.to_vec();
        intervals.reserve(other.len());
        for interval in other.intervals.iter() {
            merge_into(&mut intervals, interval.clone());
        }
        self.store(intervals);
    }

    /// Remove every index covered by `range`, clipping the intervals that
    /// straddle its bounds. Ranges falling in a gap are a no-op.
    pub fn delete_interval(&mut self, range: &F::Interval) {
        let intervals = &self.intervals;

        // First interval to remove or clip.
        let mut first = search_index(intervals, |p| by_start(p, range));
        if first > 0 && intervals[first - 1].end() >= range.start() {
            first -= 1;
        }
        if first >= intervals.len() {
            return;
        }

        // Last interval to remove or clip.
        let last = search_index(intervals, |p| by_end(p, range));
        let last = if last >= intervals.len() || intervals[last].start() > range.end() {
            match last.checked_sub(1) {
                Some(last) => last,
                None => return,
            }
        } else {
            last
        };
        if last < first {
            return;
        }

        let mut updated = intervals.to_vec();
        let first_erased = updated[first].clone();
        if first == last {
            //      dddd
            //   oooooooooo
            let mut kept: SmallVec<[F::Interval; 2]> = SmallVec::new();
            if first_erased.start() < range.start() {
                kept.push(first_erased.with_bounds(first_erased.start(), range.start() - 1));
            }
            if first_erased.end() > range.end() {
                kept.push(first_erased.with_bounds(range.end() + 1, first_erased.end()));
            }
            updated.splice(first..=first, kept);
        } else {
            //      dddddddddddddd
            //   oooooo  ooo   oooooo
            let mut drain_start = first;
            let mut drain_end = last + 1;
            if first_erased.start() < range.start() {
                updated[first] = first_erased.with_bounds(first_erased.start(), range.start() - 1);
                drain_start += 1;
            }
            let last_erased = &updated[last];
            if last_erased.end() > range.end() {
                updated[last] = last_erased.with_bounds(range.end() + 1, last_erased.end());
                drain_end -= 1;
            }
            updated.drain(drain_start..drain_end);
        }
        self.store(updated);
    }

    /// All intervals sharing at least one index with `query`, in order.
    ///
    /// With `clip` the first and last results are trimmed to the bounds of
    /// `query`. The set itself is never modified.
    pub fn spanned_intervals(&self, query: &F::Interval, clip: bool) -> Vec<F::Interval> {
        let intervals = &self.intervals;

        let mut start = search_index(intervals, |p| by_start(p, query));
        if start > 0 && intervals[start - 1].end() >= query.start() {
            start -= 1;
        }
        if start >= intervals.len() {
            return Vec::new();
        }

        // One past the last spanned interval.
        let mut end = search_index(intervals, |p| by_end(p, query));
        if end < intervals.len() && intervals[end].start() <= query.end() {
            end += 1;
        }
        if end <= start {
            return Vec::new();
        }

        let mut spanned = intervals[start..end].to_vec();
        if clip {
            let first = &spanned[0];
            spanned[0] = first.with_bounds(first.start().max(query.start()), first.end());
            let last_index = spanned.len() - 1;
            let last = &spanned[last_index];
            spanned[last_index] = last.with_bounds(last.start(), last.end().min(query.end()));
            debug_assert!(check_overlap(&spanned));
        }
        spanned
    }

    /// Returns `true` if a single interval of the set covers all of `query`
    pub fn in_interval_set(&self, query: &F::Interval) -> bool {
        match self.intervals.binary_search_by(|p| by_overlap(p, query)) {
            Ok(index) => {
                let found = &self.intervals[index];
                query.start() >= found.start() && query.end() <= found.end()
            }
            Err(_) => false,
        }
    }

    /// Writes the count followed by every delta-encoded interval
    pub fn write_to<W: Write>(&self, output: &mut W) -> Result<()> {
        debug_assert!(check_overlap(&self.intervals));
        let count = i32::try_from(self.intervals.len()).map_err(|_| {
            Error::UnsupportedFormat(format!(
                "{} intervals exceed the persisted count range",
                self.intervals.len()
            ))
        })?;
        output.write_i32::<BigEndian>(count)?;

        let mut previous = None;
        for interval in self.intervals.iter() {
            self.factory.write_interval(interval, previous, output)?;
            previous = Some(interval);
        }
        debug!(count, "wrote interval set");
        Ok(())
    }

    /// Replaces the contents of this set with a sequence written by
    /// [`IntervalSet::write_to`]. On error the set is left unchanged.
    pub fn read_from<R: Read>(&mut self, input: &mut R) -> Result<()> {
        let count = input.read_i32::<BigEndian>()?;
        let count = usize::try_from(count)
            .map_err(|_| Error::CorruptData(format!("negative interval count {}", count)))?;

        let mut read_into: Vec<F::Interval> = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
        for _ in 0..count {
            let interval = self.factory.read_interval(read_into.last(), input)?;
            read_into.push(interval);
        }

        if let Some(pair) = read_into.windows(2).find(|p| p[0].end() >= p[1].start()) {
            warn!(first = %pair[0], second = %pair[1], "rejecting overlapping persisted intervals");
            return Err(Error::CorruptData(format!(
                "{} overlaps {}",
                pair[0], pair[1]
            )));
        }
        debug!(count, "read interval set");
        self.store(read_into);
        Ok(())
    }

    /// Writes a header naming the format version and interval variant,
    /// followed by the unversioned layout
    pub fn write_versioned<W: Write>(&self, output: &mut W) -> Result<()> {
        output.write_all(&FORMAT_MAGIC)?;
        output.write_u8(FORMAT_VERSION)?;
        output.write_u8(self.factory.variant())?;
        self.write_to(output)
    }

    /// Reads a set written by [`IntervalSet::write_versioned`], rejecting
    /// unknown versions and sets of a different interval variant
    pub fn read_versioned<R: Read>(factory: F, input: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if magic != FORMAT_MAGIC {
            return Err(Error::UnsupportedFormat(format!(
                "bad magic {:02x?}",
                magic
            )));
        }
        let version = input.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedFormat(format!(
                "format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }
        let variant = input.read_u8()?;
        if variant != factory.variant() {
            return Err(Error::UnsupportedFormat(format!(
                "interval variant {} (expected {})",
                variant,
                factory.variant()
            )));
        }
        Self::read(factory, input)
    }

    /// Renders the intervals one per line between markers and logs the
    /// result at debug level
    pub fn dump(&self) -> String {
        let rendered = render(&self.intervals);
        debug!("{}", rendered);
        rendered
    }
}

/// Interval variant stored in a versioned header, or `None` if `header`
/// does not start with one
pub fn format_variant(header: &[u8]) -> Option<u8> {
    if header.len() < 6 || header[..4] != FORMAT_MAGIC || header[4] != FORMAT_VERSION {
        return None;
    }
    Some(header[5])
}

/// Index of the match, or the insertion point when there is none
fn search_index<I, C>(intervals: &[I], compare: C) -> usize
where
    C: FnMut(&I) -> std::cmp::Ordering,
{
    match intervals.binary_search_by(compare) {
        Ok(index) | Err(index) => index,
    }
}

fn render<I: Interval>(intervals: &[I]) -> String {
    let mut out = String::from("----\n");
    for interval in intervals {
        let _ = writeln!(out, "{}", interval);
    }
    out.push_str("====\n");
    out
}

/// Merge `new_interval` into the sorted sequence `intervals`.
///
/// The new interval first absorbs a touching left neighbour, then sweeps
/// right over every interval it touches. Merge results that end with the
/// new interval's piece may still reach further intervals, so the sweep
/// continues with that piece; any other result ends the sweep.
fn merge_into<I: Interval>(intervals: &mut Vec<I>, new_interval: I) {
    if intervals.is_empty() {
        intervals.push(new_interval);
        return;
    }

    let mut index = search_index(intervals, |p| by_start(p, &new_interval));
    let mut pending = new_interval;

    //          nnnnnnnnn
    // oooooooooo
    if index > 0 && intervals[index - 1].end().saturating_add(1) >= pending.start() {
        let result = intervals[index - 1].merge(&pending);
        let other_index = result.other_index();
        let (other, rest) = result.split_other();
        intervals.splice(index - 1..index, rest);
        index = index - 1 + other_index;
        pending = other;
    }

    while index < intervals.len() {
        let current = &intervals[index];
        let reach = pending.end().saturating_add(1);

        //            nnnnnnnnnnnn
        //  oooooo                    ooooo
        if current.start() > reach {
            intervals.insert(index, pending);
            join_neighbours(intervals, index);
            return;
        }

        // nnnnnnnnnn             nnnnnn
        //           oooooooo   oooooooooooo
        let touches_end = current.start() == reach;
        let contains = current.start() <= pending.start() && current.end() >= pending.end();
        let result = current.merge(&pending);
        if touches_end || contains || !result.other_is_last() {
            let placed = index + result.other_index();
            intervals.splice(index..=index, result.into_pieces());
            join_neighbours(intervals, placed);
            return;
        }

        //  nnnnnnnnnnnnnnnnnnn
        //    oooooo    ooooo
        let (other, rest) = result.split_other();
        let advance = rest.len();
        intervals.splice(index..=index, rest);
        index += advance;
        pending = other;
    }

    intervals.push(pending);
    let placed = intervals.len() - 1;
    join_neighbours(intervals, placed);
}

/// Coalesce the interval at `index` with touching neighbours of the same
/// kind. An exact replacement can leave an equal-tag neighbour adjacent.
fn join_neighbours<I: Interval>(intervals: &mut Vec<I>, index: usize) {
    if let Some(joined) = intervals
        .get(index + 1)
        .and_then(|next| join_pair(&intervals[index], next))
    {
        intervals[index] = joined;
        intervals.remove(index + 1);
    }
    if index > 0 {
        if let Some(joined) = join_pair(&intervals[index - 1], &intervals[index]) {
            intervals[index - 1] = joined;
            intervals.remove(index);
        }
    }
}

/// The single interval covering `left` and `right` when they touch and
/// merge without splitting
fn join_pair<I: Interval>(left: &I, right: &I) -> Option<I> {
    if left.end().checked_add(1) != Some(right.start()) {
        return None;
    }
    let mut pieces = right.merge(left).into_pieces();
    if pieces.len() == 1 {
        pieces.pop()
    } else {
        None
    }
}

impl<F: IntervalFactory> fmt::Debug for IntervalSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.intervals.iter()).finish()
    }
}

impl<F: IntervalFactory> PartialEq for IntervalSet<F> {
    fn eq(&self, other: &Self) -> bool {
        self.intervals == other.intervals
    }
}

impl<F: IntervalFactory> Eq for IntervalSet<F> {}

impl<F: IntervalFactory + Default> Default for IntervalSet<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::check_coalesced;
    use crate::config::IntervalConfig;
    use crate::interval::{SimpleInterval, TaggedInterval};
    use quickcheck::quickcheck;
    use std::collections::{BTreeMap, BTreeSet};

    fn simple(bounds: &[(i64, i64)]) -> SimpleIntervalSet {
        let mut set = SimpleIntervalSet::new(SimpleFactory::uncached());
        for &(start, end) in bounds {
            set.merge_interval(SimpleInterval::new(start, end));
        }
        set
    }

    fn tagged(bounds: &[(i64, i64, i64)]) -> TaggedIntervalSet {
        let mut set = TaggedIntervalSet::new(TaggedFactory::uncached());
        for &(start, end, tag) in bounds {
            set.merge_interval(TaggedInterval::new(start, end, tag));
        }
        set
    }

    fn simple_bounds(set: &SimpleIntervalSet) -> Vec<(i64, i64)> {
        set.as_slice().iter().map(|i| (i.start(), i.end())).collect()
    }

    fn tagged_bounds(set: &TaggedIntervalSet) -> Vec<(i64, i64, i64)> {
        set.as_slice()
            .iter()
            .map(|i| (i.start(), i.end(), i.tag()))
            .collect()
    }

    #[test]
    fn test_coalesces_out_of_order_inserts() {
        let set = simple(&[(0, 1), (4, 5), (2, 3)]);
        assert_eq!(simple_bounds(&set), vec![(0, 5)]);
    }

    #[test]
    fn test_merge_many_under_one_interval() {
        let set = tagged(&[(1, 1, 0), (100, 100, 0), (110, 120, 0), (0, 115, 0)]);
        assert_eq!(tagged_bounds(&set), vec![(0, 120, 0)]);
    }

    #[test]
    fn test_insert_at_end_and_start() {
        assert_eq!(simple_bounds(&simple(&[(0, 0), (1, 1)])), vec![(0, 1)]);
        assert_eq!(simple_bounds(&simple(&[(0, 0), (2, 2)])), vec![(0, 0), (2, 2)]);
        assert_eq!(simple_bounds(&simple(&[(1, 1), (0, 0)])), vec![(0, 1)]);
        assert_eq!(simple_bounds(&simple(&[(2, 2), (0, 0)])), vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn test_merge_previous_and_multiple_following() {
        let set = simple(&[(0, 5), (8, 9), (15, 30), (40, 41)]);
        let mut set = set;
        set.merge_interval(SimpleInterval::new(3, 20));
        assert_eq!(simple_bounds(&set), vec![(0, 30), (40, 41)]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut once = simple(&[(0, 3), (10, 12)]);
        once.merge_interval(SimpleInterval::new(2, 11));
        let mut twice = once.clone();
        twice.merge_interval(SimpleInterval::new(2, 11));
        assert_eq!(once, twice);
        assert_eq!(simple_bounds(&once), vec![(0, 12)]);
    }

    #[test]
    fn test_subset_and_superset_inserts() {
        assert_eq!(simple_bounds(&simple(&[(0, 10), (3, 4)])), vec![(0, 10)]);
        assert_eq!(simple_bounds(&simple(&[(3, 4), (0, 10)])), vec![(0, 10)]);
    }

    #[test]
    fn test_tagged_split_in_three() {
        let set = tagged(&[(0, 10, 1), (3, 5, 2)]);
        assert_eq!(
            tagged_bounds(&set),
            vec![(0, 2, 1), (3, 5, 2), (6, 10, 1)]
        );
    }

    #[test]
    fn test_tagged_superset_overwrites() {
        let set = tagged(&[(3, 5, 1), (0, 10, 2)]);
        assert_eq!(tagged_bounds(&set), vec![(0, 10, 2)]);
    }

    #[test]
    fn test_tagged_neighbours_without_merge() {
        let set = tagged(&[(0, 0, 0), (2, 2, 1), (1, 1, 2)]);
        assert_eq!(
            tagged_bounds(&set),
            vec![(0, 0, 0), (1, 1, 2), (2, 2, 1)]
        );
    }

    #[test]
    fn test_tagged_multi_break() {
        let set = tagged(&[(0, 1, 0), (2, 3, 1), (1, 2, 2)]);
        assert_eq!(
            tagged_bounds(&set),
            vec![(0, 0, 0), (1, 2, 2), (3, 3, 1)]
        );
    }

    #[test]
    fn test_tagged_multi_overwrite_break() {
        let set = tagged(&[(0, 1, 0), (2, 2, 1), (3, 4, 2), (1, 3, 3)]);
        assert_eq!(
            tagged_bounds(&set),
            vec![(0, 0, 0), (1, 3, 3), (4, 4, 2)]
        );
    }

    #[test]
    fn test_tagged_equal_tag_rejoins_fragments() {
        let mut set = tagged(&[(0, 10, 1), (3, 5, 2)]);
        set.merge_interval(TaggedInterval::new(3, 5, 1));
        assert_eq!(tagged_bounds(&set), vec![(0, 10, 1)]);
    }

    fn equal_tags_joined(intervals: &[TaggedInterval]) -> bool {
        intervals
            .windows(2)
            .all(|p| p[0].end() + 1 < p[1].start() || p[0].tag() != p[1].tag())
    }

    #[test]
    fn test_exact_replacement_joins_following_equal_tag() {
        let set = tagged(&[(6, 9, 1), (7, 9, 0), (6, 6, 0)]);
        assert_eq!(tagged_bounds(&set), vec![(6, 9, 0)]);

        let set = tagged(&[(7, 8, 0), (2, 4, 1), (5, 6, 0), (2, 4, 0)]);
        assert_eq!(tagged_bounds(&set), vec![(2, 8, 0)]);
        assert!(set.in_interval_set(&TaggedInterval::new(2, 8, 0)));
    }

    #[test]
    fn test_exact_replacement_joins_preceding_equal_tag() {
        let set = tagged(&[(0, 3, 2), (4, 6, 1), (4, 6, 2)]);
        assert_eq!(tagged_bounds(&set), vec![(0, 6, 2)]);

        let set = tagged(&[(0, 3, 2), (4, 6, 1), (7, 9, 2), (4, 6, 2)]);
        assert_eq!(tagged_bounds(&set), vec![(0, 9, 2)]);
        assert!(equal_tags_joined(set.as_slice()));
    }

    #[test]
    fn test_delete_splits_interval() {
        let mut set = simple(&[(0, 10)]);
        set.delete_interval(&SimpleInterval::new(3, 5));
        assert_eq!(simple_bounds(&set), vec![(0, 2), (6, 10)]);
    }

    #[test]
    fn test_delete_whole_and_disjoint() {
        let mut set = simple(&[(0, 10)]);
        set.delete_interval(&SimpleInterval::new(20, 30));
        assert_eq!(simple_bounds(&set), vec![(0, 10)]);
        set.delete_interval(&SimpleInterval::new(0, 10));
        assert!(set.is_empty());
    }

    #[test]
    fn test_delete_on_empty_set() {
        let mut set = tagged(&[]);
        set.delete_interval(&TaggedInterval::new(4, 11, -1));
        assert!(set.is_empty());
    }

    #[test]
    fn test_delete_hole_before_and_after() {
        let mut set = tagged(&[(1, 2, 0), (10, 10, 1)]);
        set.delete_interval(&TaggedInterval::new(3, 9, 1));
        set.delete_interval(&TaggedInterval::new(0, 0, 1));
        set.delete_interval(&TaggedInterval::new(11, 14, 1));
        assert_eq!(tagged_bounds(&set), vec![(1, 2, 0), (10, 10, 1)]);
    }

    #[test]
    fn test_delete_breaks_middle_interval() {
        let mut set = tagged(&[(1, 3, 0), (4, 6, 1), (7, 8, 2)]);
        set.delete_interval(&TaggedInterval::new(5, 5, 5));
        assert_eq!(
            tagged_bounds(&set),
            vec![(1, 3, 0), (4, 4, 1), (6, 6, 1), (7, 8, 2)]
        );
    }

    #[test]
    fn test_delete_exact_interval() {
        let mut set = tagged(&[(1, 3, 0), (4, 6, 1), (7, 8, 2)]);
        set.delete_interval(&TaggedInterval::new(4, 6, 5));
        assert_eq!(tagged_bounds(&set), vec![(1, 3, 0), (7, 8, 2)]);
    }

    #[test]
    fn test_delete_clips_both_neighbours() {
        let mut set = tagged(&[(0, 1, 1), (3, 4, 3)]);
        set.delete_interval(&TaggedInterval::new(1, 3, 2));
        assert_eq!(tagged_bounds(&set), vec![(0, 0, 1), (4, 4, 3)]);
    }

    #[test]
    fn test_delete_across_many() {
        let mut set = simple(&[(0, 2), (4, 5), (7, 8), (10, 14)]);
        set.delete_interval(&SimpleInterval::new(1, 11));
        assert_eq!(simple_bounds(&set), vec![(0, 0), (12, 14)]);

        let mut set = tagged(&[(4, 7, 1), (8, 11, 2)]);
        set.delete_interval(&TaggedInterval::new(4, 11, -1));
        assert!(set.is_empty());
    }

    #[test]
    fn test_spanned_intervals_clipping() {
        let set = simple(&[(0, 10)]);
        let query = SimpleInterval::new(5, 20);
        assert_eq!(set.spanned_intervals(&query, true), vec![SimpleInterval::new(5, 10)]);
        assert_eq!(set.spanned_intervals(&query, false), vec![SimpleInterval::new(0, 10)]);
        assert_eq!(simple_bounds(&set), vec![(0, 10)]);
    }

    #[test]
    fn test_spanned_intervals_gaps_and_edges() {
        let set = simple(&[(1, 2), (10, 10)]);
        assert!(set.spanned_intervals(&SimpleInterval::new(3, 9), false).is_empty());
        assert!(set.spanned_intervals(&SimpleInterval::new(-5, 0), false).is_empty());
        assert!(set.spanned_intervals(&SimpleInterval::new(11, 20), true).is_empty());

        let spanned = set.spanned_intervals(&SimpleInterval::new(2, 10), true);
        assert_eq!(
            spanned,
            vec![SimpleInterval::new(2, 2), SimpleInterval::new(10, 10)]
        );

        let spanned = set.spanned_intervals(&SimpleInterval::new(0, 100), false);
        assert_eq!(spanned.len(), 2);
    }

    #[test]
    fn test_spanned_subset_clips_both_ends() {
        let set = tagged(&[(0, 100, 9)]);
        let spanned = set.spanned_intervals(&TaggedInterval::new(10, 20, 0), true);
        assert_eq!(spanned, vec![TaggedInterval::new(10, 20, 9)]);
    }

    #[test]
    fn test_in_interval_set() {
        let set = tagged(&[(0, 2, 0)]);
        assert!(set.in_interval_set(&TaggedInterval::new(1, 1, 0)));
        assert!(set.in_interval_set(&TaggedInterval::new(0, 2, 0)));
        assert!(!set.in_interval_set(&TaggedInterval::new(2, 3, 0)));
        assert!(!set.in_interval_set(&TaggedInterval::new(100, 100, 0)));

        let set = tagged(&[(1, 2, 0), (10, 10, 0)]);
        assert!(!set.in_interval_set(&TaggedInterval::new(1, 10, 0)));
        assert!(!set.in_interval_set(&TaggedInterval::new(0, 1, 0)));
    }

    #[test]
    fn test_from_sorted_rejects_overlap() {
        let ok = SimpleIntervalSet::from_sorted(
            SimpleFactory::uncached(),
            vec![SimpleInterval::new(0, 1), SimpleInterval::new(3, 4)],
        );
        assert_eq!(simple_bounds(&ok.unwrap()), vec![(0, 1), (3, 4)]);

        let overlapping = SimpleIntervalSet::from_sorted(
            SimpleFactory::uncached(),
            vec![SimpleInterval::new(0, 3), SimpleInterval::new(3, 4)],
        );
        assert!(matches!(overlapping, Err(Error::OverlappingIntervals(_))));
    }

    #[test]
    fn test_merge_set() {
        let mut target = simple(&[(0, 1), (10, 11)]);
        let source = simple(&[(2, 3), (8, 9), (20, 21)]);
        target.merge_set(&source);
        assert_eq!(simple_bounds(&target), vec![(0, 3), (8, 11), (20, 21)]);
    }

    #[test]
    fn test_round_trip_tagged() {
        let mut set = tagged(&[]);
        for i in (10..100).step_by(4) {
            set.merge_interval(TaggedInterval::new(i, i + 2, i % 3));
        }

        let mut bytes = Vec::new();
        set.write_to(&mut bytes).unwrap();
        let restored =
            TaggedIntervalSet::read(TaggedFactory::uncached(), &mut bytes.as_slice()).unwrap();
        assert_eq!(restored, set);
    }

    #[test]
    fn test_round_trip_empty_and_single() {
        for set in [simple(&[]), simple(&[(-4, 7)])] {
            let mut bytes = Vec::new();
            set.write_to(&mut bytes).unwrap();
            let restored =
                SimpleIntervalSet::read(SimpleFactory::uncached(), &mut bytes.as_slice()).unwrap();
            assert_eq!(restored, set);
        }
    }

    #[test]
    fn test_legacy_layout() {
        let set = simple(&[(0, 1), (4, 5)]);
        let mut bytes = Vec::new();
        set.write_to(&mut bytes).unwrap();

        let mut expected = 2i32.to_be_bytes().to_vec();
        for field in [0i64, 1, 3, 1] {
            expected.extend_from_slice(&field.to_be_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_read_rejects_overlap_and_negative_count() {
        let mut bytes = 2i32.to_be_bytes().to_vec();
        for field in [0i64, 5, -2, 1] {
            bytes.extend_from_slice(&field.to_be_bytes());
        }
        let mut set = simple(&[(100, 200)]);
        let result = set.read_from(&mut bytes.as_slice());
        assert!(matches!(result, Err(Error::CorruptData(_))));
        assert_eq!(simple_bounds(&set), vec![(100, 200)]);

        let bytes = (-1i32).to_be_bytes();
        let result = SimpleIntervalSet::read(SimpleFactory::uncached(), &mut &bytes[..]);
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_versioned_rejects_other_variant() {
        let set = simple(&[(0, 3)]);
        let mut bytes = Vec::new();
        set.write_versioned(&mut bytes).unwrap();
        assert_eq!(format_variant(&bytes), Some(1));

        let result =
            TaggedIntervalSet::read_versioned(TaggedFactory::uncached(), &mut bytes.as_slice());
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));

        let restored =
            SimpleIntervalSet::read_versioned(SimpleFactory::uncached(), &mut bytes.as_slice())
                .unwrap();
        assert_eq!(restored, set);

        bytes[4] = FORMAT_VERSION + 1;
        let result =
            SimpleIntervalSet::read_versioned(SimpleFactory::uncached(), &mut bytes.as_slice());
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_sets_share_interned_sequences() {
        let factory = SimpleFactory::with_config(&IntervalConfig::default());
        let mut a = SimpleIntervalSet::new(factory.clone());
        let mut b = SimpleIntervalSet::new(factory.clone());
        for set in [&mut a, &mut b] {
            set.merge_interval(SimpleInterval::new(0, 9));
            set.merge_interval(SimpleInterval::new(20, 29));
        }
        assert!(Arc::ptr_eq(&a.intervals(), &b.intervals()));

        let snapshot = a.intervals();
        a.delete_interval(&SimpleInterval::new(0, 9));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(b.len(), 2);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_dump() {
        let set = simple(&[(0, 1), (4, 5)]);
        assert_eq!(set.dump(), "----\n[0, 1]\n[4, 5]\n====\n");
    }

    fn simple_from_ops(ops: &[(i8, u8, bool)]) -> (SimpleIntervalSet, BTreeSet<i64>) {
        let mut set = simple(&[]);
        let mut model = BTreeSet::new();
        for &(start, len, insert) in ops {
            let start = start as i64;
            let end = start + (len % 16) as i64;
            let interval = SimpleInterval::new(start, end);
            if insert {
                set.merge_interval(interval);
                model.extend(start..=end);
            } else {
                set.delete_interval(&interval);
                for index in start..=end {
                    model.remove(&index);
                }
            }
        }
        (set, model)
    }

    #[test]
    fn test_simple_set_matches_point_model() {
        fn prop(ops: Vec<(i8, u8, bool)>) -> bool {
            let (set, model) = simple_from_ops(&ops);
            let covered: BTreeSet<i64> = set
                .as_slice()
                .iter()
                .flat_map(|i| i.start()..=i.end())
                .collect();
            check_overlap(set.as_slice()) && check_coalesced(set.as_slice()) && covered == model
        }
        quickcheck(prop as fn(Vec<(i8, u8, bool)>) -> bool);
    }

    #[test]
    fn test_tagged_set_matches_point_model() {
        fn prop(ops: Vec<(i8, u8, u8, bool)>) -> bool {
            let mut set = tagged(&[]);
            let mut model = BTreeMap::new();
            for (start, len, tag, insert) in ops {
                let start = start as i64;
                let end = start + (len % 16) as i64;
                let tag = (tag % 3) as i64;
                let interval = TaggedInterval::new(start, end, tag);
                if insert {
                    set.merge_interval(interval);
                    for index in start..=end {
                        model.insert(index, tag);
                    }
                } else {
                    set.delete_interval(&interval);
                    for index in start..=end {
                        model.remove(&index);
                    }
                }
            }
            let covered: BTreeMap<i64, i64> = set
                .as_slice()
                .iter()
                .flat_map(|i| (i.start()..=i.end()).map(move |index| (index, i.tag())))
                .collect();
            check_overlap(set.as_slice()) && equal_tags_joined(set.as_slice()) && covered == model
        }
        quickcheck(prop as fn(Vec<(i8, u8, u8, bool)>) -> bool);
    }

    #[test]
    fn test_merge_idempotence_property() {
        fn prop(ops: Vec<(i8, u8, bool)>, start: i8, len: u8) -> bool {
            let (mut once, _) = simple_from_ops(&ops);
            let interval = SimpleInterval::new(start as i64, start as i64 + (len % 32) as i64);
            once.merge_interval(interval);
            let mut twice = once.clone();
            twice.merge_interval(interval);
            once == twice
        }
        quickcheck(prop as fn(Vec<(i8, u8, bool)>, i8, u8) -> bool);
    }

    #[test]
    fn test_round_trip_property() {
        fn prop(ops: Vec<(i8, u8, bool)>) -> bool {
            let (set, _) = simple_from_ops(&ops);
            let mut bytes = Vec::new();
            if set.write_to(&mut bytes).is_err() {
                return false;
            }
            match SimpleIntervalSet::read(SimpleFactory::uncached(), &mut bytes.as_slice()) {
                Ok(restored) => restored == set,
                Err(_) => false,
            }
        }
        quickcheck(prop as fn(Vec<(i8, u8, bool)>) -> bool);
    }
}
