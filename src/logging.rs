//! Tracing subscriber setup

use crate::error::{BlockTimeError, Result};
use std::str::FromStr;
use tracing::{debug, Level};

pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim())
        .map_err(|_| BlockTimeError::ConfigError(format!("unknown log level: {:?}", level)))
}

/// Installs a global fmt subscriber. A subscriber that is already
/// installed is left in place.
pub fn init_logging(level: &str) -> Result<()> {
    let level = parse_level(level)?;
    if let Err(e) = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
    {
        debug!("Keeping existing tracing subscriber: {}", e);
    }
    Ok(())
}
