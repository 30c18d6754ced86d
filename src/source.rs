//! Block timestamp sources
//!
//! The converter never owns block timestamps; it asks a [`BlockTimeSource`].
//! Implementations:
//! - [`InMemoryBlockTimes`] - validated in-memory table
//! - [`SqliteBlockTimes`] - SQLite block-time index
//! - [`CachedBlockTimes`] - LRU read-through wrapper around any source

pub mod cached;
pub mod memory;
pub mod sqlite;

pub use cached::{CacheStats, CachedBlockTimes};
pub use memory::InMemoryBlockTimes;
pub use sqlite::SqliteBlockTimes;

use crate::block::BlockIndex;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A monotonic, non-decreasing mapping from block number to block time.
pub trait BlockTimeSource: Send + Sync {
    fn timestamp_of(&self, block: BlockIndex) -> Result<DateTime<Utc>>;

    /// Lowest block the source knows about.
    fn earliest_block(&self) -> Result<BlockIndex> {
        Ok(BlockIndex::GENESIS)
    }

    /// Highest indexed block, if the source tracks one.
    fn latest_block(&self) -> Result<Option<BlockIndex>> {
        Ok(None)
    }
}

impl<S: BlockTimeSource + ?Sized> BlockTimeSource for &S {
    fn timestamp_of(&self, block: BlockIndex) -> Result<DateTime<Utc>> {
        (**self).timestamp_of(block)
    }

    fn earliest_block(&self) -> Result<BlockIndex> {
        (**self).earliest_block()
    }

    fn latest_block(&self) -> Result<Option<BlockIndex>> {
        (**self).latest_block()
    }
}

impl<S: BlockTimeSource + ?Sized> BlockTimeSource for Arc<S> {
    fn timestamp_of(&self, block: BlockIndex) -> Result<DateTime<Utc>> {
        (**self).timestamp_of(block)
    }

    fn earliest_block(&self) -> Result<BlockIndex> {
        (**self).earliest_block()
    }

    fn latest_block(&self) -> Result<Option<BlockIndex>> {
        (**self).latest_block()
    }
}

impl BlockTimeSource for Box<dyn BlockTimeSource> {
    fn timestamp_of(&self, block: BlockIndex) -> Result<DateTime<Utc>> {
        (**self).timestamp_of(block)
    }

    fn earliest_block(&self) -> Result<BlockIndex> {
        (**self).earliest_block()
    }

    fn latest_block(&self) -> Result<Option<BlockIndex>> {
        (**self).latest_block()
    }
}
