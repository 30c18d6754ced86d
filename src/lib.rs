//! blocktime - bounded conversion between block numbers and UTC time
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Conversion
//! - [`converter`] - Block number / timestamp conversion bounded by a current block
//! - [`block`] - Block number value type
//! - [`time`] - Time inputs, parsing and UTC arithmetic
//!
//! ## Block Time Sources
//! - [`source`] - Source trait plus in-memory, SQLite and cached implementations
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing setup

#![forbid(unsafe_code)]

// ============================================================================
// Conversion
// ============================================================================
pub mod block;
pub mod converter;
pub mod time;

// ============================================================================
// Block Time Sources
// ============================================================================
pub mod source;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;

pub use block::{BlockIndex, BlockRecord};
pub use converter::BlockTimeConverter;
pub use error::{BlockTimeError, Result};
pub use source::{BlockTimeSource, CachedBlockTimes, InMemoryBlockTimes, SqliteBlockTimes};
pub use time::TimeInput;
