#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod lib_mem;
pub mod metrics;
pub mod service;
pub mod validation;

pub use config::BurstConfig;
pub use domain::{AppState, BurstPhase, BurstRequest, StatusReport};
pub use error::BurstError;
pub use http::{app_state, configure, serve};
pub use http::{
    burst_start, burst_stop, clear_limit, echo, healthz, livez, reset, scrape_metrics, set_limit,
    status,
};
pub use metrics::Metrics;
pub use service::{BurstController, BurstOutcome};
pub use validation::validate_burst;
