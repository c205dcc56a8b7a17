#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use chimp_mem_burst::domain::{BurstPhase, BurstState};

#[test]
fn new_state_is_idle() {
    let st = BurstState::new(Some(10));
    assert!(!st.running);
    assert_eq!(st.phase, BurstPhase::Idle);
    assert_eq!(st.current(), 0);
    assert_eq!(st.cap, Some(10));
}

#[test]
fn effective_target_respects_cap() {
    let mut st = BurstState::new(Some(10));
    st.target = 50;
    assert_eq!(st.effective_target(), 10);
    st.cap = None;
    assert_eq!(st.effective_target(), 50);
}

#[test]
fn active_only_for_current_generation() {
    let mut st = BurstState::new(None);
    st.running = true;
    st.generation = 3;
    assert!(st.is_active(3));
    assert!(!st.is_active(2));
    st.running = false;
    assert!(!st.is_active(3));
}

#[test]
fn phase_display() {
    assert_eq!(BurstPhase::Holding.to_string(), "HOLDING");
    assert_eq!(
        serde_json::to_string(&BurstPhase::Stopped).expect("json"),
        "\"STOPPED\""
    );
}
