#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use chimp_mem_burst::{serve, BurstConfig};
use tracing::info;

fn init_tracing() {
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    fmt.json().init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cfg = BurstConfig::from_env();
    info!(
        bind = %cfg.bind,
        cap = ?cfg.cap,
        step_bytes = cfg.step_bytes,
        tick_ms = u64::try_from(cfg.tick.as_millis()).unwrap_or(u64::MAX),
        "starting memory burst agent"
    );
    serve(cfg).await?;
    Ok(())
}
