#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const MIB: usize = 1024 * 1024;

/// Longest hold a burst may request, and longest ramp bound: one week.
pub const MAX_HOLD_MINUTES: u64 = 7 * 24 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurstConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Maximum buffer size ever applied. `None` means unbounded.
    pub cap: Option<usize>,
    /// Bytes added per ramp tick.
    pub step_bytes: usize,
    /// Delay between ramp steps.
    pub tick: Duration,
    /// Granularity at which the hold phase checks for a stop.
    pub hold_slice: Duration,
    /// Hold used when a start request does not carry one.
    pub default_hold: Duration,
    /// Ramp gives up after this long even if the target was not reached.
    pub max_ramp: Option<Duration>,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            cap: None,
            step_bytes: 5 * MIB,
            tick: Duration::from_secs(1),
            hold_slice: Duration::from_secs(1),
            default_hold: Duration::from_secs(10 * 60),
            max_ramp: None,
        }
    }
}

impl BurstConfig {
    /// Read `BURST_*` variables, keeping defaults for missing or bad values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(s) = lookup("BURST_BIND") {
            if !s.trim().is_empty() {
                cfg.bind = s.trim().to_string();
            }
        }

        if let Some(v) = parse_var::<usize, _>(&lookup, "BURST_MAX_MEMORY_BYTES") {
            cfg.cap = Some(v);
        }

        if let Some(v) = parse_var::<usize, _>(&lookup, "BURST_STEP_BYTES") {
            if v == 0 {
                warn!(key = "BURST_STEP_BYTES", "must be > 0, keeping default");
            } else {
                cfg.step_bytes = v;
            }
        }

        if let Some(v) = parse_var::<u64, _>(&lookup, "BURST_TICK_MS") {
            if v == 0 {
                warn!(key = "BURST_TICK_MS", "must be > 0, keeping default");
            } else {
                cfg.tick = Duration::from_millis(v);
            }
        }

        if let Some(v) = parse_var::<u64, _>(&lookup, "BURST_HOLD_SLICE_MS") {
            if v == 0 {
                warn!(key = "BURST_HOLD_SLICE_MS", "must be > 0, keeping default");
            } else {
                cfg.hold_slice = Duration::from_millis(v);
            }
        }

        if let Some(v) = parse_var::<u64, _>(&lookup, "BURST_DEFAULT_HOLD_MINUTES") {
            if v > MAX_HOLD_MINUTES {
                warn!(key = "BURST_DEFAULT_HOLD_MINUTES", max = MAX_HOLD_MINUTES, "too large, keeping default");
            } else {
                cfg.default_hold = Duration::from_secs(v * 60);
            }
        }

        if let Some(v) = parse_var::<u64, _>(&lookup, "BURST_MAX_RAMP_SECONDS") {
            if v > MAX_HOLD_MINUTES * 60 {
                warn!(key = "BURST_MAX_RAMP_SECONDS", max = MAX_HOLD_MINUTES * 60, "too large, ignoring");
            } else {
                cfg.max_ramp = Some(Duration::from_secs(v));
            }
        }

        cfg
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "unparseable value, keeping default");
            None
        }
    }
}
