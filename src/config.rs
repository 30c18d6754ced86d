//! Configuration management for blocktime

use crate::block::BlockIndex;
use crate::converter::BlockTimeConverter;
use crate::error::{BlockTimeError, Result};
use crate::logging::parse_level;
use crate::source::{CachedBlockTimes, SqliteBlockTimes};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    /// Pinned current block; the latest indexed block when unset.
    #[serde(default)]
    pub current_block: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_path")]
    pub path: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_source_path() -> String {
    "./data/block_times.db".to_string()
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads `path`, falling back to defaults when the file does not exist.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => parse_config(&config_str),
        // Provide sane defaults when the file is absent
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.source.path.is_empty() {
            return Err(BlockTimeError::ConfigError(
                "source.path must be set".to_string(),
            ));
        }

        if self.source.cache_capacity == 0 {
            return Err(BlockTimeError::ConfigError(
                "source.cache_capacity must be greater than zero".to_string(),
            ));
        }

        parse_level(&self.logging.level)?;
        Ok(())
    }

    /// Opens the SQLite index behind an LRU cache and pins the current block.
    pub fn open_converter(&self) -> Result<BlockTimeConverter<CachedBlockTimes<SqliteBlockTimes>>> {
        let db = SqliteBlockTimes::open(&self.source.path)?;
        let source = CachedBlockTimes::new(db, self.source.cache_capacity);

        let converter = match self.chain.current_block {
            Some(block) => BlockTimeConverter::new(source, BlockIndex(block))?,
            None => BlockTimeConverter::at_latest(source)?,
        };

        info!(
            "Block time converter ready (source = {}, current block = {})",
            self.source.path,
            converter.current_block()
        );
        Ok(converter)
    }
}
