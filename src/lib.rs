//! IntervalSet: sorted, non-overlapping inclusive integer interval sets
//!
//! This crate tracks which positions of an integer-indexed space are covered
//! (plain intervals) and which writer covered them (tagged intervals). Sets
//! persist in a compact delta-encoded format and share identical interval
//! sequences across instances through an interning cache.

#![warn(missing_docs)]

/// Interval value types and merge results
pub mod interval;

/// Order relations used to search sorted interval sequences
pub mod compare;

/// Interning caches shared between interval sets
pub mod cache;

/// Construction, codec and interning policy
pub mod factory;

/// The interval set container
pub mod set;

/// Time-series buffers built on top of interval sets
pub mod series;

// Re-exports
pub use cache::{CacheStats, InternCache, LruInternCache, NoopCache};
pub use config::IntervalConfig;
pub use error::{Error, Result};
pub use factory::{CachingFactory, DeltaCodec, IntervalFactory, SimpleFactory, TaggedFactory};
pub use interval::{Interval, MergeResult, SimpleInterval, TaggedInterval};
pub use series::{Series, SeriesBuffer};
pub use set::{IntervalSet, SimpleIntervalSet, TaggedIntervalSet};

/// Error types for interval set operations
pub mod error {
    use std::error::Error as StdError;
    use std::fmt;
    use std::io;

    /// Result alias used throughout the crate
    pub type Result<T> = std::result::Result<T, Error>;

    /// Error types that can occur in interval set operations
    #[derive(Debug)]
    pub enum Error {
        /// An I/O error occurred
        Io(io::Error),
        /// An interval was built with its end before its start
        InvalidInterval {
            /// Requested start
            start: i64,
            /// Requested end
            end: i64,
        },
        /// A presorted input sequence overlapped or was out of order
        OverlappingIntervals(String),
        /// Persisted state could not be decoded into a valid set
        CorruptData(String),
        /// Persisted state uses a header, version or variant this build does not read
        UnsupportedFormat(String),
        /// An index fell outside the bounds of a series buffer
        OutOfRange {
            /// The offending index
            index: i64,
            /// First valid index
            start: i64,
            /// Last valid index
            end: i64,
        },
        /// Configuration error
        ConfigError(String),
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Error::Io(err) => write!(f, "I/O error: {}", err),
                Error::InvalidInterval { start, end } => {
                    write!(f, "Invalid interval: end {} is before start {}", end, start)
                }
                Error::OverlappingIntervals(msg) => write!(f, "Overlapping intervals: {}", msg),
                Error::CorruptData(msg) => write!(f, "Corrupt interval data: {}", msg),
                Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
                Error::OutOfRange { index, start, end } => {
                    write!(f, "Index {} is outside [{}, {}]", index, start, end)
                }
                Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            }
        }
    }

    impl StdError for Error {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            match self {
                Error::Io(err) => Some(err),
                _ => None,
            }
        }
    }

    impl From<io::Error> for Error {
        fn from(err: io::Error) -> Self {
            Error::Io(err)
        }
    }
}

/// Configuration options for interval sets
pub mod config {
    use crate::error::{Error, Result};

    /// Sizing of the interning cache shared by a family of interval sets
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct IntervalConfig {
        /// Maximum number of distinct interval sequences kept for sharing.
        /// Zero disables interning.
        pub cache_capacity: usize,
        /// Number of independently locked cache shards
        pub cache_shards: usize,
    }

    impl IntervalConfig {
        /// Check that the configuration can build a cache
        pub fn validate(&self) -> Result<()> {
            if self.cache_shards == 0 {
                return Err(Error::ConfigError(
                    "cache_shards must be at least 1".to_string(),
                ));
            }
            Ok(())
        }
    }

    impl Default for IntervalConfig {
        fn default() -> Self {
            Self {
                cache_capacity: 4096,
                cache_shards: 16,
            }
        }
    }
}
