#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use serde::Deserialize;
use std::time::Duration;

use crate::config::MAX_HOLD_MINUTES;
use crate::domain::BurstRequest;
use crate::error::{BurstError, Result};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SizeQuery {
    pub memory_size: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BurstQuery {
    pub memory_size: Option<String>,
    /// Minutes.
    pub hold_duration: Option<String>,
}

pub fn parse_memory_size(raw: Option<&str>) -> Result<usize> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(BurstError::InvalidArgument(
            "memory_size query parameter is required".into(),
        ));
    }
    raw.parse::<usize>()
        .map_err(|_| BurstError::InvalidArgument(format!("invalid memory_size value: {raw}")))
}

pub fn parse_hold_minutes(raw: Option<&str>, default: Duration) -> Result<Duration> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => {
            let minutes = s.parse::<u64>().map_err(|_| {
                BurstError::InvalidArgument(format!("invalid hold_duration value: {s}"))
            })?;
            if minutes > MAX_HOLD_MINUTES {
                return Err(BurstError::InvalidArgument(format!(
                    "hold_duration must be at most {MAX_HOLD_MINUTES} minutes"
                )));
            }
            Ok(Duration::from_secs(minutes * 60))
        }
    }
}

pub fn validate_burst(query: &BurstQuery, default_hold: Duration) -> Result<BurstRequest> {
    let target = parse_memory_size(query.memory_size.as_deref())?;
    let hold = parse_hold_minutes(query.hold_duration.as_deref(), default_hold)?;
    Ok(BurstRequest { target, hold })
}
