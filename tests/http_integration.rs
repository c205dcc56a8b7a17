#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use chimp_mem_burst::{app_state, configure, BurstConfig};
use serde_json::Value;

fn test_config() -> BurstConfig {
    BurstConfig {
        step_bytes: 64 * 1024,
        tick: Duration::from_millis(100),
        ..BurstConfig::default()
    }
}

#[actix_web::test]
async fn probes_and_metrics() {
    let state = app_state(&test_config()).expect("state");
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    for uri in ["/healthz", "/livez", "/metrics"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success(), "{uri} failed: {}", resp.status());
    }
}

#[actix_web::test]
async fn echo_validates_and_allocates() {
    let state = app_state(&test_config()).expect("state");
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    for uri in ["/echo", "/echo?memory_size=", "/echo?memory_size=abc", "/echo?memory_size=-5"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
    }

    let req = test::TestRequest::get().uri("/echo?memory_size=4096").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["applied_size"], 4096);
    assert_eq!(body["method"], "GET");

    let req = test::TestRequest::get().uri("/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["current_size"], 4096);
    assert_eq!(body["diagnostics"]["allocations_total"], 1);
}

#[actix_web::test]
async fn limit_caps_allocations() {
    let state = app_state(&test_config()).expect("state");
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::put().uri("/limit?memory_size=1024").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/echo?memory_size=8192").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["applied_size"], 1024);

    let req = test::TestRequest::delete().uri("/limit").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["cap"].is_null());
}

#[actix_web::test]
async fn burst_start_stop_reset() {
    let state = app_state(&test_config()).expect("state");
    let app = test::init_service(App::new().app_data(web::Data::new(state)).configure(configure)).await;

    let req = test::TestRequest::get().uri("/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["current_size"], 0);
    assert_eq!(body["running"], false);

    let req = test::TestRequest::post().uri("/burst/start").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/burst/start?memory_size=1048576&hold_duration=soon")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/burst/start?memory_size=1048576&hold_duration=1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let req = test::TestRequest::post()
        .uri("/burst/start?memory_size=1048576")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get().uri("/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["running"], true);
    assert_eq!(body["target_size"], 1_048_576);
    assert_eq!(body["hold_seconds"], 60);

    let req = test::TestRequest::post().uri("/burst/stop").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["was_running"], true);

    let req = test::TestRequest::post().uri("/burst/stop").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["was_running"], false);

    let req = test::TestRequest::post().uri("/reset").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["running"], false);
    assert_eq!(body["current_size"], 0);
}
