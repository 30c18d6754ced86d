//! SQLite-backed block-time index

use super::BlockTimeSource;
use crate::block::{BlockIndex, BlockRecord};
use crate::error::{BlockTimeError, Result};
use crate::time::from_unix_seconds;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

pub struct SqliteBlockTimes {
    conn: Mutex<Connection>,
}

impl SqliteBlockTimes {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| BlockTimeError::DatabaseError(format!("Failed to open database: {}", e)))?;
        debug!("Opened block time index at {}", path.as_ref().display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BlockTimeError::DatabaseError(format!("Failed to open database: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS block_times (
                number INTEGER PRIMARY KEY,
                timestamp INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            BlockTimeError::DatabaseError(format!("Failed to create block_times table: {}", e))
        })?;

        Ok(SqliteBlockTimes {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BlockTimeError::DatabaseError("Mutex poisoned".to_string()))
    }

    /// Inserts or replaces records atomically. The whole batch is rolled
    /// back if any record would make timestamps decrease with block number.
    pub fn insert_records(&self, records: &[BlockRecord]) -> Result<()> {
        let conn_guard = self.lock()?;
        let tx = conn_guard.unchecked_transaction().map_err(|e| {
            BlockTimeError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;

        for record in records {
            let number = i64::try_from(record.number).map_err(|_| {
                BlockTimeError::InvalidInput(format!(
                    "block number {} does not fit the index",
                    record.number
                ))
            })?;
            tx.execute(
                "INSERT OR REPLACE INTO block_times (number, timestamp) VALUES (?1, ?2)",
                params![number, record.timestamp],
            )
            .map_err(|e| BlockTimeError::DatabaseError(format!("Failed to save block time: {}", e)))?;
            check_neighbours(&tx, number, record.timestamp)?;
        }

        tx.commit().map_err(|e| {
            BlockTimeError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;

        debug!("Indexed {} block timestamps", records.len());
        Ok(())
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM block_times", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Rejects `timestamp` if it is earlier than the previous stored block or
/// later than the next one.
fn check_neighbours(conn: &Connection, number: i64, timestamp: i64) -> Result<()> {
    let prev: Option<(i64, i64)> = conn
        .query_row(
            "SELECT number, timestamp FROM block_times WHERE number < ?1 ORDER BY number DESC LIMIT 1",
            params![number],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| BlockTimeError::DatabaseError(format!("Failed to query previous block: {}", e)))?;

    if let Some((prev_number, prev_ts)) = prev {
        if prev_ts > timestamp {
            return Err(BlockTimeError::InvalidInput(format!(
                "block timestamps must be non-decreasing: block {} ({}) precedes block {} ({})",
                prev_number, prev_ts, number, timestamp
            )));
        }
    }

    let next: Option<(i64, i64)> = conn
        .query_row(
            "SELECT number, timestamp FROM block_times WHERE number > ?1 ORDER BY number ASC LIMIT 1",
            params![number],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|e| BlockTimeError::DatabaseError(format!("Failed to query next block: {}", e)))?;

    if let Some((next_number, next_ts)) = next {
        if next_ts < timestamp {
            return Err(BlockTimeError::InvalidInput(format!(
                "block timestamps must be non-decreasing: block {} ({}) precedes block {} ({})",
                number, timestamp, next_number, next_ts
            )));
        }
    }

    Ok(())
}

impl BlockTimeSource for SqliteBlockTimes {
    fn timestamp_of(&self, block: BlockIndex) -> Result<DateTime<Utc>> {
        let conn = self.lock()?;
        let ts: Option<i64> = conn
            .query_row(
                "SELECT timestamp FROM block_times WHERE number = ?1",
                params![block.get() as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| BlockTimeError::DatabaseError(format!("Failed to query block time: {}", e)))?;

        match ts {
            Some(ts) => from_unix_seconds(ts),
            None => Err(BlockTimeError::Source(format!(
                "no timestamp indexed for block {}",
                block
            ))),
        }
    }

    fn earliest_block(&self) -> Result<BlockIndex> {
        let conn = self.lock()?;
        let min: Option<i64> =
            conn.query_row("SELECT MIN(number) FROM block_times", [], |row| row.get(0))?;
        Ok(min.map_or(BlockIndex::GENESIS, |n| BlockIndex(n as u64)))
    }

    fn latest_block(&self) -> Result<Option<BlockIndex>> {
        let conn = self.lock()?;
        let max: Option<i64> =
            conn.query_row("SELECT MAX(number) FROM block_times", [], |row| row.get(0))?;
        Ok(max.map(|n| BlockIndex(n as u64)))
    }
}
