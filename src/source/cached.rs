//! LRU read-through cache for block timestamps
//!
//! Block timestamps below the chain head never change, so a source can be
//! wrapped once and shared. Only successful lookups are cached.

use super::BlockTimeSource;
use crate::block::BlockIndex;
use crate::error::Result;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct CachedBlockTimes<S> {
    inner: S,
    cache: Mutex<LruCache<BlockIndex, DateTime<Utc>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: BlockTimeSource> CachedBlockTimes<S> {
    /// A capacity of zero is treated as one.
    pub fn new(inner: S, capacity: usize) -> Self {
        let capacity_nz = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity_nz)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            len: cache.len(),
            capacity: cache.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl<S: BlockTimeSource> BlockTimeSource for CachedBlockTimes<S> {
    fn timestamp_of(&self, block: BlockIndex) -> Result<DateTime<Utc>> {
        if let Some(ts) = self.cache.lock().get(&block).copied() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(ts);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("Block time cache miss for block {}", block);
        // Lock is not held across the inner lookup
        let ts = self.inner.timestamp_of(block)?;
        self.cache.lock().put(block, ts);
        Ok(ts)
    }

    fn earliest_block(&self) -> Result<BlockIndex> {
        self.inner.earliest_block()
    }

    fn latest_block(&self) -> Result<Option<BlockIndex>> {
        self.inner.latest_block()
    }
}
