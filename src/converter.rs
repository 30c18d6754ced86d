//! Bounded conversion between block numbers and UTC time
//!
//! A [`BlockTimeConverter`] pairs a [`BlockTimeSource`] with the current
//! block, the highest block that counts as existing. Block numbers above it
//! are rejected. Times after it clamp to it.

use crate::block::BlockIndex;
use crate::error::{BlockTimeError, Result};
use crate::source::BlockTimeSource;
use crate::time::{self, TimeInput};
use chrono::{DateTime, Utc};
use std::ops::RangeInclusive;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct BlockTimeConverter<S> {
    source: S,
    current_block: BlockIndex,
}

impl<S: BlockTimeSource> BlockTimeConverter<S> {
    /// Fails if `current_block` is below the source's earliest block, or
    /// if the source has no timestamp for it.
    pub fn new(source: S, current_block: BlockIndex) -> Result<Self> {
        let earliest = source.earliest_block()?;
        if current_block < earliest {
            return Err(BlockTimeError::InvalidInput(format!(
                "current block {} precedes the earliest known block {}",
                current_block, earliest
            )));
        }
        source.timestamp_of(current_block)?;
        Ok(Self {
            source,
            current_block,
        })
    }

    /// Pins the converter at the source's latest indexed block.
    pub fn at_latest(source: S) -> Result<Self> {
        let latest = source.latest_block()?.ok_or_else(|| {
            BlockTimeError::Source("source has no indexed blocks".to_string())
        })?;
        Self::new(source, latest)
    }

    pub fn current_block(&self) -> BlockIndex {
        self.current_block
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Checks a raw block number against `[0, current_block]`.
    pub fn validate_block(&self, raw: i64) -> Result<BlockIndex> {
        BlockIndex::bounded(raw as i128, self.current_block)
    }

    /// Timestamp of `block`.
    pub fn current_timestamp(&self, block: i64) -> Result<DateTime<Utc>> {
        let block = self.validate_block(block)?;
        self.source.timestamp_of(block)
    }

    /// Timestamp of `block` as unix seconds.
    pub fn unix_timestamp(&self, block: i64) -> Result<i64> {
        Ok(self.current_timestamp(block)?.timestamp())
    }

    /// The last block at or before `time`.
    ///
    /// Times after the current block's timestamp yield the current block.
    /// Times before the earliest known block are out of range, and naive
    /// datetimes are rejected as invalid input.
    pub fn from_timestamp<T: Into<TimeInput>>(&self, input: T) -> Result<BlockIndex> {
        let target = input.into().to_utc()?;

        let current_ts = self.source.timestamp_of(self.current_block)?;
        if target >= current_ts {
            if target > current_ts {
                debug!(
                    "{} is past block {} ({}); clamping to current block",
                    target, self.current_block, current_ts
                );
            }
            return Ok(self.current_block);
        }

        let earliest = self.source.earliest_block()?;
        let earliest_ts = self.source.timestamp_of(earliest)?;
        if target < earliest_ts {
            return Err(BlockTimeError::TimestampOutOfRange {
                requested: target,
                earliest: earliest_ts,
            });
        }

        // Invariant: ts(lo) <= target < ts(hi)
        let mut lo = earliest.get();
        let mut hi = self.current_block.get();
        let mut probes = 0u32;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            probes += 1;
            if self.source.timestamp_of(BlockIndex(mid))? <= target {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        trace!("Resolved {} to block {} in {} probes", target, lo, probes);
        Ok(BlockIndex(lo))
    }

    /// `block + delta`, bounded by `[0, current_block]`.
    pub fn offset_blocks(&self, block: i64, delta: i64) -> Result<BlockIndex> {
        self.validate_block(block)?.offset(delta, self.current_block)
    }

    /// Pure time arithmetic, not bounded by the chain.
    pub fn offset_seconds(&self, point: DateTime<Utc>, delta_seconds: i64) -> Result<DateTime<Utc>> {
        time::offset_seconds(point, delta_seconds)
    }

    /// Blocks covering the window `[start, end]`.
    pub fn block_range<A, B>(&self, start: A, end: B) -> Result<RangeInclusive<BlockIndex>>
    where
        A: Into<TimeInput>,
        B: Into<TimeInput>,
    {
        let start = start.into().to_utc()?;
        let end = end.into().to_utc()?;
        if start > end {
            return Err(BlockTimeError::InvalidInput(format!(
                "window start {} is after end {}",
                start, end
            )));
        }
        Ok(self.from_timestamp(start)?..=self.from_timestamp(end)?)
    }
}
