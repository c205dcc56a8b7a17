#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use chimp_mem_burst::metrics::Metrics;

#[test]
fn create_and_encode() {
    let m = Metrics::new().expect("metrics");
    let buf = m.encode_text().expect("encode");
    assert!(!buf.is_empty());
    let text = String::from_utf8(buf).expect("utf8");
    assert!(text.contains("agent_burst_active"));
}

#[test]
fn allocation_counters_feed_diagnostics() {
    let m = Metrics::new().expect("metrics");
    m.record_allocation(1024);
    m.record_allocation(2048);
    let d = m.diagnostics();
    assert_eq!(d.allocations_total, 2);
    assert_eq!(d.allocated_bytes_total, 3072);
    assert_eq!(m.burst_current_bytes.get(), 2048);
}

#[test]
fn burst_lifecycle_gauges() {
    let m = Metrics::new().expect("metrics");
    m.mark_burst_started(4096);
    assert_eq!(m.burst_active.get(), 1);
    assert_eq!(m.burst_target_bytes.get(), 4096);
    m.mark_burst_cancelled();
    assert_eq!(m.burst_active.get(), 0);
    assert_eq!(m.burst_cancelled_total.get(), 1);
    m.set_cap(None);
    assert_eq!(m.burst_cap_bytes.get(), 0);
}
