use super::BlockTimeSource;
use crate::block::{BlockIndex, BlockRecord};
use crate::error::{BlockTimeError, Result};
use crate::time::from_unix_seconds;
use chrono::{DateTime, Utc};

/// Contiguous block timestamps starting at `first_block`, in unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryBlockTimes {
    first_block: u64,
    timestamps: Vec<i64>,
}

impl InMemoryBlockTimes {
    /// Fails if `timestamps` is empty or ever decreases.
    pub fn new(first_block: u64, timestamps: Vec<i64>) -> Result<Self> {
        if timestamps.is_empty() {
            return Err(BlockTimeError::InvalidInput(
                "block time table must contain at least one block".to_string(),
            ));
        }
        // Every block number up to the last one must fit in u64
        if first_block.checked_add(timestamps.len() as u64 - 1).is_none() {
            return Err(BlockTimeError::InvalidInput(format!(
                "{} blocks starting at block {} overflow the block number range",
                timestamps.len(),
                first_block
            )));
        }
        if let Some(i) = timestamps.windows(2).position(|w| w[1] < w[0]) {
            return Err(BlockTimeError::InvalidInput(format!(
                "block timestamps must be non-decreasing: block {} ({}) precedes block {} ({})",
                first_block + i as u64,
                timestamps[i],
                first_block + i as u64 + 1,
                timestamps[i + 1]
            )));
        }
        for ts in &timestamps {
            from_unix_seconds(*ts)?;
        }
        Ok(Self {
            first_block,
            timestamps,
        })
    }

    /// `count` blocks spaced `interval_secs` apart, starting at `genesis_time`.
    pub fn with_interval(
        first_block: u64,
        genesis_time: DateTime<Utc>,
        interval_secs: i64,
        count: usize,
    ) -> Result<Self> {
        if interval_secs < 0 {
            return Err(BlockTimeError::InvalidInput(format!(
                "block interval must not be negative, got {}",
                interval_secs
            )));
        }
        let start = genesis_time.timestamp();
        let timestamps = (0..count as i64)
            .map(|i| {
                i.checked_mul(interval_secs)
                    .and_then(|offset| start.checked_add(offset))
                    .ok_or_else(|| {
                        BlockTimeError::InvalidInput("block interval overflows".to_string())
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(first_block, timestamps)
    }

    /// Records may arrive in any order but must cover a contiguous range.
    pub fn from_records(mut records: Vec<BlockRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.number);
        let first_block = records
            .first()
            .map(|r| r.number)
            .ok_or_else(|| BlockTimeError::InvalidInput("no block records".to_string()))?;

        for (i, record) in records.iter().enumerate() {
            let expected = first_block.checked_add(i as u64).ok_or_else(|| {
                BlockTimeError::InvalidInput(format!(
                    "block records overflow the block number range after block {}",
                    first_block
                ))
            })?;
            if record.number != expected {
                return Err(BlockTimeError::InvalidInput(format!(
                    "block records are not contiguous: expected block {}, found {}",
                    expected, record.number
                )));
            }
        }

        Self::new(first_block, records.into_iter().map(|r| r.timestamp).collect())
    }

    /// Parses a JSON array of `{"number": .., "timestamp": ..}` objects.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<BlockRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    pub fn records(&self) -> Vec<BlockRecord> {
        self.timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| BlockRecord::new(self.first_block + i as u64, *ts))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

impl BlockTimeSource for InMemoryBlockTimes {
    fn timestamp_of(&self, block: BlockIndex) -> Result<DateTime<Utc>> {
        let ts = block
            .get()
            .checked_sub(self.first_block)
            .and_then(|offset| self.timestamps.get(offset as usize))
            .ok_or_else(|| {
                BlockTimeError::Source(format!("no timestamp recorded for block {}", block))
            })?;
        from_unix_seconds(*ts)
    }

    fn earliest_block(&self) -> Result<BlockIndex> {
        Ok(BlockIndex(self.first_block))
    }

    fn latest_block(&self) -> Result<Option<BlockIndex>> {
        Ok(Some(BlockIndex(
            self.first_block + self.timestamps.len() as u64 - 1,
        )))
    }
}
