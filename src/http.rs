#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use actix_web::http::StatusCode;
use actix_web::{delete, get, post, put, web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::BurstConfig;
use crate::domain::{AppState, StatusResponse};
use crate::error::BurstError;
use crate::metrics::Metrics;
use crate::service::BurstController;
use crate::validation::{parse_memory_size, validate_burst, BurstQuery, SizeQuery};

#[get("/echo")]
pub async fn echo(
    req: HttpRequest,
    query: web::Query<SizeQuery>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let requested = match parse_memory_size(query.memory_size.as_deref()) {
        Ok(v) => v,
        Err(e) => return burst_error(&e),
    };
    let ctrl = data.ctrl.clone();
    let applied = match web::block(move || ctrl.stress_once(requested)).await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "stress allocation failed");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "allocation task failed");
        }
    };
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "method": req.method().as_str(),
        "url": req.uri().to_string(),
        "requested_size": requested,
        "applied_size": applied,
    }))
}

#[post("/burst/start")]
pub async fn burst_start(query: web::Query<BurstQuery>, data: web::Data<AppState>) -> HttpResponse {
    let req = match validate_burst(&query, data.default_hold) {
        Ok(r) => r,
        Err(e) => return burst_error(&e),
    };
    info!(target_bytes = req.target, hold_seconds = req.hold.as_secs(), "burst start request");
    match data.ctrl.start(req) {
        Ok(()) => HttpResponse::Accepted().json(json!({"status":"ok"})),
        Err(e) => burst_error(&e),
    }
}

#[post("/burst/stop")]
pub async fn burst_stop(data: web::Data<AppState>) -> HttpResponse {
    let was_running = data.ctrl.stop();
    HttpResponse::Ok().json(json!({"status":"ok","was_running":was_running}))
}

#[post("/reset")]
pub async fn reset(data: web::Data<AppState>) -> HttpResponse {
    data.ctrl.reset();
    HttpResponse::Ok().json(json!({"status":"ok"}))
}

#[put("/limit")]
pub async fn set_limit(query: web::Query<SizeQuery>, data: web::Data<AppState>) -> HttpResponse {
    let cap = match parse_memory_size(query.memory_size.as_deref()) {
        Ok(v) => v,
        Err(e) => return burst_error(&e),
    };
    let ctrl = data.ctrl.clone();
    if let Err(e) = web::block(move || ctrl.set_cap(Some(cap))).await {
        error!(error = %e, "cap update failed");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "cap update failed");
    }
    HttpResponse::Ok().json(json!({"status":"ok","cap":cap}))
}

#[delete("/limit")]
pub async fn clear_limit(data: web::Data<AppState>) -> HttpResponse {
    data.ctrl.set_cap(None);
    HttpResponse::Ok().json(json!({"status":"ok","cap":null}))
}

#[get("/status")]
pub async fn status(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StatusResponse {
        burst: data.ctrl.status(),
        diagnostics: data.metrics.diagnostics(),
    })
}

#[get("/healthz")]
pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status":"ok"}))
}

#[get("/livez")]
pub async fn livez() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status":"ok"}))
}

#[get("/metrics")]
pub async fn scrape_metrics(data: web::Data<AppState>) -> HttpResponse {
    match data.metrics.encode_text() {
        Ok(buf) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buf),
        Err(e) => {
            error!(error=%format!("{e:#}"), "encode metrics failed");
            HttpResponse::InternalServerError().body("encode metrics failed")
        }
    }
}

pub fn app_state(cfg: &BurstConfig) -> anyhow::Result<AppState> {
    let metrics = Metrics::new()?;
    Ok(AppState {
        ctrl: BurstController::new(cfg, metrics.clone()),
        metrics,
        default_hold: cfg.default_hold,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(echo)
        .service(burst_start)
        .service(burst_stop)
        .service(reset)
        .service(set_limit)
        .service(clear_limit)
        .service(status)
        .service(healthz)
        .service(livez)
        .service(scrape_metrics);
}

pub async fn serve(cfg: BurstConfig) -> std::io::Result<()> {
    let state = app_state(&cfg).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::Other, format!("metrics init: {e:#}"))
    })?;
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind(cfg.bind.as_str())?
    .run()
    .await
}

fn burst_error(e: &BurstError) -> HttpResponse {
    let code = match e {
        BurstError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        BurstError::AlreadyRunning => StatusCode::CONFLICT,
    };
    warn!(status = code.as_u16(), reason = %e, "request rejected");
    json_error(code, &e.to_string())
}

fn json_error(code: StatusCode, reason: &str) -> HttpResponse {
    HttpResponse::build(code).json(json!({"status":"error","reason":reason}))
}
