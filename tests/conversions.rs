//! Integration tests for block/time conversion over real sources

use blocktime::source::CacheStats;
use blocktime::{
    BlockIndex, BlockRecord, BlockTimeConverter, BlockTimeSource, CachedBlockTimes,
    InMemoryBlockTimes, SqliteBlockTimes, TimeInput,
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

const BLOCKS: u64 = 2_000;

fn genesis() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()
}

/// Irregular but non-decreasing block spacing, with a few repeated timestamps
fn records() -> Vec<BlockRecord> {
    let mut ts = genesis().timestamp();
    (0..BLOCKS)
        .map(|number| {
            if number > 0 {
                ts += [13, 12, 0, 15, 11][(number % 5) as usize];
            }
            BlockRecord::new(number, ts)
        })
        .collect()
}

/// Helper to build a SQLite index in a scratch directory
fn indexed_db() -> Result<(TempDir, SqliteBlockTimes), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let db = SqliteBlockTimes::open(dir.path().join("block_times.db"))?;
    db.insert_records(&records())?;
    Ok((dir, db))
}

#[test]
fn test_sqlite_and_memory_sources_agree() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, db) = indexed_db()?;
    let memory = InMemoryBlockTimes::from_records(records())?;

    let on_disk = BlockTimeConverter::at_latest(db)?;
    let in_memory = BlockTimeConverter::at_latest(memory)?;
    assert_eq!(on_disk.current_block(), BlockIndex(BLOCKS - 1));

    let mut probe = genesis();
    let end = in_memory.current_timestamp((BLOCKS - 1) as i64)? + TimeDelta::seconds(30);
    while probe <= end {
        assert_eq!(on_disk.from_timestamp(probe)?, in_memory.from_timestamp(probe)?);
        probe += TimeDelta::seconds(7);
    }

    Ok(())
}

#[test]
fn test_repeated_timestamps_resolve_to_last_block() -> Result<(), Box<dyn std::error::Error>> {
    let source = InMemoryBlockTimes::from_records(records())?;
    let conv = BlockTimeConverter::new(source, BlockIndex(1_500))?;

    // Blocks 1 and 2 share a timestamp; block 2 is the last one at that time
    let shared = conv.current_timestamp(1)?;
    assert_eq!(shared, conv.current_timestamp(2)?);
    assert_eq!(conv.from_timestamp(shared)?, BlockIndex(2));
    assert_eq!(conv.from_timestamp(shared + TimeDelta::seconds(14))?, BlockIndex(2));

    Ok(())
}

#[test]
fn test_demonstration_walkthrough() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, db) = indexed_db()?;
    let conv = BlockTimeConverter::new(db, BlockIndex(1_800))?;
    let current = conv.current_block().get() as i64;

    // Current block and its time
    let now = conv.current_timestamp(current)?;
    assert_eq!(conv.unix_timestamp(current)?, now.timestamp());

    // Arithmetic on block numbers
    let earlier = conv.offset_blocks(current, -1_000)?;
    assert_eq!(earlier, BlockIndex(800));
    assert!(conv.current_timestamp(earlier.get() as i64)? < now);

    // An hour before the current block
    let hour_ago = conv.offset_seconds(now, -3_600)?;
    let block = conv.from_timestamp(hour_ago)?;
    assert!(conv.current_timestamp(block.get() as i64)? <= hour_ago);
    assert!(conv.current_timestamp(block.get() as i64 + 1)? > hour_ago);

    // Stepping past the current block or below zero fails
    assert!(conv.offset_blocks(current, 1).unwrap_err().is_out_of_range());
    assert!(conv.current_timestamp(-1).unwrap_err().is_out_of_range());
    assert!(conv.current_timestamp(current + 1).unwrap_err().is_out_of_range());

    // The future clamps, naive time is rejected
    let future = TimeInput::from(Utc::now() + TimeDelta::days(10));
    assert_eq!(conv.from_timestamp(future)?, BlockIndex(1_800));
    let naive = TimeInput::Naive(hour_ago.naive_utc());
    assert!(conv.from_timestamp(naive).unwrap_err().is_invalid_input());

    Ok(())
}

#[test]
fn test_string_inputs() -> Result<(), Box<dyn std::error::Error>> {
    let conv = BlockTimeConverter::at_latest(InMemoryBlockTimes::from_records(records())?)?;

    let zulu: TimeInput = "2021-06-01T00:00:00Z".parse()?;
    assert_eq!(conv.from_timestamp(zulu)?, BlockIndex(0));

    let offset: TimeInput = "2021-06-01 02:00+02:00".parse()?;
    assert_eq!(conv.from_timestamp(offset)?, BlockIndex(0));

    let millis: TimeInput = (genesis().timestamp_millis() + 13_000).to_string().parse()?;
    assert_eq!(conv.from_timestamp(millis)?, BlockIndex(2));

    let naive: TimeInput = "2021-06-01T00:00:13".parse()?;
    assert!(conv.from_timestamp(naive).unwrap_err().is_invalid_input());

    Ok(())
}

#[test]
fn test_cached_source_shared_across_threads() -> Result<(), Box<dyn std::error::Error>> {
    let (_dir, db) = indexed_db()?;
    let source = Arc::new(CachedBlockTimes::new(db, 256));
    let conv = BlockTimeConverter::at_latest(Arc::clone(&source))?;

    std::thread::scope(|scope| {
        for worker in 0..4i64 {
            let conv = &conv;
            scope.spawn(move || {
                for b in (worker..BLOCKS as i64).step_by(97) {
                    let ts = conv.current_timestamp(b).expect("block in range");
                    let resolved = conv.from_timestamp(ts).expect("resolvable time");
                    assert!(resolved.get() as i64 >= b);
                    assert_eq!(conv.current_timestamp(resolved.get() as i64).unwrap(), ts);
                }
            });
        }
    });

    let CacheStats {
        hits,
        misses,
        len,
        capacity,
    } = source.stats();
    assert!(hits > 0);
    assert!(misses > 0);
    assert!(len <= capacity);
    assert_eq!(source.latest_block()?, Some(BlockIndex(BLOCKS - 1)));

    Ok(())
}
