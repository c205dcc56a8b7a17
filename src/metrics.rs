#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result as AnyResult};
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub burst_active: IntGauge,
    pub burst_target_bytes: IntGauge,
    pub burst_current_bytes: IntGauge,
    pub burst_cap_bytes: IntGauge,
    pub burst_started_total: IntCounter,
    pub burst_cancelled_total: IntCounter,
    pub burst_completed_total: IntCounter,
    pub allocations_total: IntCounter,
    pub allocated_bytes_total: IntCounter,
}

/// Process-wide memory figures reported alongside the controller status.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Diagnostics {
    pub allocated_bytes_total: u64,
    pub allocations_total: u64,
    pub resident_memory_bytes: Option<f64>,
    pub virtual_memory_bytes: Option<f64>,
}

impl Metrics {
    pub fn new() -> AnyResult<Self> {
        let registry = Registry::new();
        let burst_active = IntGauge::with_opts(Opts::new(
            "agent_burst_active",
            "1 if a burst is running",
        ))
        .context("create burst_active")?;
        let burst_target_bytes = IntGauge::with_opts(Opts::new(
            "agent_burst_target_bytes",
            "target size of the current burst",
        ))
        .context("create burst_target_bytes")?;
        let burst_current_bytes = IntGauge::with_opts(Opts::new(
            "agent_burst_current_bytes",
            "size of the stress buffer",
        ))
        .context("create burst_current_bytes")?;
        let burst_cap_bytes = IntGauge::with_opts(Opts::new(
            "agent_burst_cap_bytes",
            "configured cap, 0 when unbounded",
        ))
        .context("create burst_cap_bytes")?;
        registry
            .register(Box::new(burst_active.clone()))
            .context("register burst_active")?;
        registry
            .register(Box::new(burst_target_bytes.clone()))
            .context("register burst_target_bytes")?;
        registry
            .register(Box::new(burst_current_bytes.clone()))
            .context("register burst_current_bytes")?;
        registry
            .register(Box::new(burst_cap_bytes.clone()))
            .context("register burst_cap_bytes")?;

        let burst_started_total =
            IntCounter::with_opts(Opts::new("agent_burst_started_total", "bursts started"))
                .context("create burst_started_total")?;
        let burst_cancelled_total = IntCounter::with_opts(Opts::new(
            "agent_burst_cancelled_total",
            "bursts ended by stop or reset",
        ))
        .context("create burst_cancelled_total")?;
        let burst_completed_total = IntCounter::with_opts(Opts::new(
            "agent_burst_completed_total",
            "bursts that ran through their hold",
        ))
        .context("create burst_completed_total")?;
        let allocations_total = IntCounter::with_opts(Opts::new(
            "agent_allocations_total",
            "stress buffer allocations",
        ))
        .context("create allocations_total")?;
        let allocated_bytes_total = IntCounter::with_opts(Opts::new(
            "agent_allocated_bytes_total",
            "bytes allocated for stress buffers",
        ))
        .context("create allocated_bytes_total")?;
        registry
            .register(Box::new(burst_started_total.clone()))
            .context("register burst_started_total")?;
        registry
            .register(Box::new(burst_cancelled_total.clone()))
            .context("register burst_cancelled_total")?;
        registry
            .register(Box::new(burst_completed_total.clone()))
            .context("register burst_completed_total")?;
        registry
            .register(Box::new(allocations_total.clone()))
            .context("register allocations_total")?;
        registry
            .register(Box::new(allocated_bytes_total.clone()))
            .context("register allocated_bytes_total")?;

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .context("register process collector")?;

        Ok(Self {
            registry,
            burst_active,
            burst_target_bytes,
            burst_current_bytes,
            burst_cap_bytes,
            burst_started_total,
            burst_cancelled_total,
            burst_completed_total,
            allocations_total,
            allocated_bytes_total,
        })
    }

    pub fn record_allocation(&self, applied: usize) {
        self.allocations_total.inc();
        self.allocated_bytes_total
            .inc_by(u64::try_from(applied).unwrap_or(u64::MAX));
        self.burst_current_bytes.set(gauge_value(applied));
    }

    pub fn mark_burst_started(&self, target: usize) {
        self.burst_started_total.inc();
        self.burst_active.set(1);
        self.burst_target_bytes.set(gauge_value(target));
    }

    pub fn clear_target(&self) {
        self.burst_target_bytes.set(0);
    }

    pub fn mark_burst_cancelled(&self) {
        self.burst_cancelled_total.inc();
        self.burst_active.set(0);
    }

    pub fn mark_burst_completed(&self) {
        self.burst_completed_total.inc();
        self.burst_active.set(0);
    }

    pub fn set_cap(&self, cap: Option<usize>) {
        self.burst_cap_bytes.set(cap.map_or(0, gauge_value));
    }

    pub fn set_current(&self, current: usize) {
        self.burst_current_bytes.set(gauge_value(current));
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            allocated_bytes_total: self.allocated_bytes_total.get(),
            allocations_total: self.allocations_total.get(),
            resident_memory_bytes: self.gauge_by_name("process_resident_memory_bytes"),
            virtual_memory_bytes: self.gauge_by_name("process_virtual_memory_bytes"),
        }
    }

    fn gauge_by_name(&self, name: &str) -> Option<f64> {
        self.registry
            .gather()
            .iter()
            .find(|mf| mf.get_name() == name)
            .and_then(|mf| mf.get_metric().first())
            .map(|m| m.get_gauge().get_value())
    }

    pub fn encode_text(&self) -> AnyResult<Vec<u8>> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf).context("encode metrics")?;
        Ok(buf)
    }
}

fn gauge_value(bytes: usize) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}
