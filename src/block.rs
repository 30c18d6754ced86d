//! Block number value type

use crate::error::{BlockTimeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative block number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockIndex(pub u64);

impl BlockIndex {
    pub const GENESIS: BlockIndex = BlockIndex(0);

    pub fn new(number: u64) -> Self {
        BlockIndex(number)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Checks a raw block number against `[0, current]`.
    pub fn bounded(raw: i128, current: BlockIndex) -> Result<Self> {
        if raw < 0 || raw > current.0 as i128 {
            return Err(BlockTimeError::BlockOutOfRange {
                requested: raw,
                current: current.0,
            });
        }
        Ok(BlockIndex(raw as u64))
    }

    /// `self + delta`, bounded by `[0, current]`.
    pub fn offset(self, delta: i64, current: BlockIndex) -> Result<Self> {
        Self::bounded(self.0 as i128 + delta as i128, current)
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockIndex {
    fn from(number: u64) -> Self {
        BlockIndex(number)
    }
}

impl From<BlockIndex> for u64 {
    fn from(block: BlockIndex) -> Self {
        block.0
    }
}

/// A `(block, unix seconds)` pair as stored in block-time indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub number: u64,
    pub timestamp: i64,
}

impl BlockRecord {
    pub fn new(number: u64, timestamp: i64) -> Self {
        Self { number, timestamp }
    }
}
