//! Order relations over intervals
//!
//! The backing sequence of an interval set is sorted by start and, because
//! it never overlaps, by end as well. These functions take the searched
//! element first and the search key second, matching
//! [`slice::binary_search_by`].

use std::cmp::Ordering;

use crate::interval::Interval;

/// Orders by start index
pub fn by_start<I: Interval>(target: &I, key: &I) -> Ordering {
    target.start().cmp(&key.start())
}

/// Orders by end index
pub fn by_end<I: Interval>(target: &I, key: &I) -> Ordering {
    target.end().cmp(&key.end())
}

/// `Less` when `target` lies entirely before `key`, `Greater` when it lies
/// entirely after, `Equal` when they share any index.
pub fn by_overlap<I: Interval>(target: &I, key: &I) -> Ordering {
    if target.end() < key.start() {
        Ordering::Less
    } else if target.start() > key.end() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Returns true if `intervals` is sorted by start and no two of them
/// share an index.
pub fn check_overlap<I: Interval>(intervals: &[I]) -> bool {
    intervals
        .windows(2)
        .all(|pair| pair[0].end() < pair[1].start())
}

/// Returns true if no two consecutive intervals touch. Holds for every
/// set of simple intervals, which coalesce on contact.
pub fn check_coalesced<I: Interval>(intervals: &[I]) -> bool {
    intervals
        .windows(2)
        .all(|pair| pair[0].end().saturating_add(1) < pair[1].start())
}
