#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::lib_mem::MemoryBlock;
use crate::metrics::Diagnostics;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BurstPhase {
    #[default]
    Idle,
    Ramping,
    Holding,
    Stopped,
}

impl std::fmt::Display for BurstPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BurstPhase::Idle => f.write_str("IDLE"),
            BurstPhase::Ramping => f.write_str("RAMPING"),
            BurstPhase::Holding => f.write_str("HOLDING"),
            BurstPhase::Stopped => f.write_str("STOPPED"),
        }
    }
}

/// Mutable controller state. Only `BurstController` touches it, always under
/// its lock.
#[derive(Debug, Default)]
pub struct BurstState {
    pub running: bool,
    pub phase: BurstPhase,
    pub target: usize,
    pub cap: Option<usize>,
    pub hold: Duration,
    pub started_ts_seconds: Option<i64>,
    /// Bumped on every start; a ramp task only acts while its own generation
    /// is current.
    pub generation: u64,
    pub block: MemoryBlock,
}

impl BurstState {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }

    pub fn current(&self) -> usize {
        self.block.len()
    }

    /// Size the ramp stops growing at.
    pub fn effective_target(&self) -> usize {
        self.cap.map_or(self.target, |c| self.target.min(c))
    }

    pub fn is_active(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}

/// A validated burst start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstRequest {
    pub target: usize,
    pub hold: Duration,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub running: bool,
    pub phase: BurstPhase,
    pub current_size: usize,
    pub target_size: usize,
    pub cap: Option<usize>,
    pub hold_seconds: u64,
    pub started_ts_seconds: Option<i64>,
}

/// `/status` body: controller view plus process diagnostics.
#[derive(Clone, Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub burst: StatusReport,
    pub diagnostics: Diagnostics,
}

#[derive(Clone)]
pub struct AppState {
    pub ctrl: crate::service::BurstController,
    pub metrics: crate::metrics::Metrics,
    pub default_hold: Duration,
}
