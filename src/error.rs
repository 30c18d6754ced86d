//! Error types for blocktime

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockTimeError {
    #[error("Block number {requested} is out of range [0, {current}]")]
    BlockOutOfRange { requested: i128, current: u64 },
    #[error("Timestamp {requested} predates the earliest known block ({earliest})")]
    TimestampOutOfRange {
        requested: DateTime<Utc>,
        earliest: DateTime<Utc>,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Block time source error: {0}")]
    Source(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl BlockTimeError {
    /// True for both block-number and timestamp range violations.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            BlockTimeError::BlockOutOfRange { .. } | BlockTimeError::TimestampOutOfRange { .. }
        )
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, BlockTimeError::InvalidInput(_))
    }
}

impl From<std::io::Error> for BlockTimeError {
    fn from(err: std::io::Error) -> Self {
        BlockTimeError::IoError(err.to_string())
    }
}

impl From<rusqlite::Error> for BlockTimeError {
    fn from(err: rusqlite::Error) -> Self {
        BlockTimeError::DatabaseError(err.to_string())
    }
}

impl From<toml::de::Error> for BlockTimeError {
    fn from(err: toml::de::Error) -> Self {
        BlockTimeError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for BlockTimeError {
    fn from(err: serde_json::Error) -> Self {
        BlockTimeError::InvalidInput(format!("Malformed block records: {}", err))
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, BlockTimeError>;
