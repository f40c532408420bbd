//! Construction, codec and interning policy for interval sets
//!
//! An [`IntervalFactory`] decides how intervals are read and written and
//! which canonical instance a freshly built sequence is replaced with. The
//! cache is injected, never global, so callers choose how widely sequences
//! are shared and tests can swap in a [`NoopCache`].

pub mod codec;

pub use codec::DeltaCodec;

use std::fmt;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::{InternCache, LruInternCache, NoopCache};
use crate::config::IntervalConfig;
use crate::error::Result;
use crate::interval::{Interval, SimpleInterval, TaggedInterval};

/// Per-variant policy consulted by [`IntervalSet`](crate::set::IntervalSet)
pub trait IntervalFactory: Clone + Send + Sync {
    /// The interval variant this factory produces
    type Interval: Interval;

    /// Discriminator written into versioned headers
    fn variant(&self) -> u8;

    /// Read one interval. `previous` is `None` for the first record of a
    /// sequence, which disables delta decoding for that record.
    fn read_interval<R: Read>(
        &self,
        previous: Option<&Self::Interval>,
        input: &mut R,
    ) -> Result<Self::Interval>;

    /// Write one interval, delta-encoded against `previous`
    fn write_interval<W: Write>(
        &self,
        current: &Self::Interval,
        previous: Option<&Self::Interval>,
        output: &mut W,
    ) -> Result<()>;

    /// Swap `candidate` for an equal canonical sequence when one is known
    fn cached_list(&self, candidate: Arc<[Self::Interval]>) -> Arc<[Self::Interval]>;
}

/// Factory for any [`DeltaCodec`] interval backed by an injected cache
pub struct CachingFactory<I> {
    cache: Arc<dyn InternCache<I>>,
    _variant: PhantomData<fn() -> I>,
}

/// Factory for plain interval sets
pub type SimpleFactory = CachingFactory<SimpleInterval>;

/// Factory for tagged interval sets
pub type TaggedFactory = CachingFactory<TaggedInterval>;

impl<I: DeltaCodec> CachingFactory<I> {
    /// Create a factory interning through `cache`
    pub fn new(cache: Arc<dyn InternCache<I>>) -> Self {
        Self {
            cache,
            _variant: PhantomData,
        }
    }

    /// Create a factory that never shares sequences
    pub fn uncached() -> Self {
        Self::new(Arc::new(NoopCache))
    }

    /// Create a factory with its own LRU cache sized by `config`
    pub fn with_config(config: &IntervalConfig) -> Self {
        Self::new(Arc::new(LruInternCache::with_config(config)))
    }

    /// The cache this factory interns through
    pub fn cache(&self) -> &Arc<dyn InternCache<I>> {
        &self.cache
    }
}

impl<I> Clone for CachingFactory<I> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            _variant: PhantomData,
        }
    }
}

impl<I: DeltaCodec> Default for CachingFactory<I> {
    fn default() -> Self {
        Self::uncached()
    }
}

impl<I> fmt::Debug for CachingFactory<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingFactory")
            .field("cached_sequences", &self.cache.len())
            .finish()
    }
}

impl<I: DeltaCodec> IntervalFactory for CachingFactory<I> {
    type Interval = I;

    fn variant(&self) -> u8 {
        I::VARIANT
    }

    fn read_interval<R: Read>(&self, previous: Option<&I>, input: &mut R) -> Result<I> {
        I::decode(previous, input)
    }

    fn write_interval<W: Write>(
        &self,
        current: &I,
        previous: Option<&I>,
        output: &mut W,
    ) -> Result<()> {
        current.encode(previous, output)?;
        Ok(())
    }

    fn cached_list(&self, candidate: Arc<[I]>) -> Arc<[I]> {
        self.cache.intern(candidate)
    }
}
