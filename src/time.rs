//! Time inputs and UTC time arithmetic
//!
//! A [`TimeInput`] records what the caller actually supplied, so that an
//! offset-less datetime can be told apart from a UTC one and rejected
//! instead of being silently read as UTC or local time.

use crate::error::{BlockTimeError, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

/// Unix numbers with a larger magnitude than this are milliseconds.
pub const UNIX_MILLIS_THRESHOLD: f64 = 2e10;

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeInput {
    Aware(DateTime<FixedOffset>),
    /// No offset information; never converted.
    Naive(NaiveDateTime),
    /// Seconds, or milliseconds past [`UNIX_MILLIS_THRESHOLD`].
    Unix(f64),
}

impl TimeInput {
    /// Resolves the input to an absolute UTC time point.
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        match self {
            TimeInput::Aware(dt) => Ok(dt.with_timezone(&Utc)),
            TimeInput::Naive(naive) => Err(BlockTimeError::InvalidInput(format!(
                "datetime {} has no timezone; supply an explicit UTC offset",
                naive
            ))),
            TimeInput::Unix(value) => from_unix(*value),
        }
    }

    /// Accepts a unix number or `YYYY-MM-DD[T| ]HH:MM[:SS[.f]][Z|±HH[:]MM]`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BlockTimeError::InvalidInput("empty time string".to_string()));
        }

        if let Ok(value) = trimmed.parse::<f64>() {
            return Ok(TimeInput::Unix(value));
        }

        let normalized = match trimmed.strip_suffix(['Z', 'z']) {
            Some(stripped) => format!("{}+00:00", stripped),
            None => trimmed.to_string(),
        };

        for fmt in AWARE_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
                return Ok(TimeInput::Aware(dt));
            }
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
                return Ok(TimeInput::Naive(naive));
            }
        }

        Err(BlockTimeError::InvalidInput(format!(
            "unrecognized time format: {:?}",
            input
        )))
    }
}

impl FromStr for TimeInput {
    type Err = BlockTimeError;

    fn from_str(s: &str) -> Result<Self> {
        TimeInput::parse(s)
    }
}

impl fmt::Display for TimeInput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimeInput::Aware(dt) => write!(f, "{}", dt.to_rfc3339()),
            TimeInput::Naive(naive) => write!(f, "{} (no timezone)", naive),
            TimeInput::Unix(value) => write!(f, "{}", value),
        }
    }
}

impl From<DateTime<Utc>> for TimeInput {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeInput::Aware(dt.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for TimeInput {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        TimeInput::Aware(dt)
    }
}

impl From<NaiveDateTime> for TimeInput {
    fn from(naive: NaiveDateTime) -> Self {
        TimeInput::Naive(naive)
    }
}

impl From<i64> for TimeInput {
    fn from(value: i64) -> Self {
        TimeInput::Unix(value as f64)
    }
}

impl From<f64> for TimeInput {
    fn from(value: f64) -> Self {
        TimeInput::Unix(value)
    }
}

/// Interprets a unix number as seconds or milliseconds by magnitude.
pub fn from_unix(value: f64) -> Result<DateTime<Utc>> {
    if !value.is_finite() {
        return Err(BlockTimeError::InvalidInput(format!(
            "unix timestamp {} is not finite",
            value
        )));
    }

    let seconds = if value.abs() > UNIX_MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    };

    let mut whole = seconds.floor();
    let mut nanos = ((seconds - whole) * 1e9).round() as u32;
    if nanos >= 1_000_000_000 {
        whole += 1.0;
        nanos = 0;
    }

    DateTime::from_timestamp(whole as i64, nanos).ok_or_else(|| {
        BlockTimeError::InvalidInput(format!("unix timestamp {} is out of range", value))
    })
}

/// Unix seconds to a UTC time point.
pub fn from_unix_seconds(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        BlockTimeError::InvalidInput(format!("unix timestamp {} is out of range", seconds))
    })
}

/// Shifts a time point by whole seconds. Not bounded by any chain state.
pub fn offset_seconds(point: DateTime<Utc>, delta_seconds: i64) -> Result<DateTime<Utc>> {
    TimeDelta::try_seconds(delta_seconds)
        .and_then(|delta| point.checked_add_signed(delta))
        .ok_or_else(|| {
            BlockTimeError::InvalidInput(format!(
                "{} shifted by {}s is not representable",
                point, delta_seconds
            ))
        })
}
