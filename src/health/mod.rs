//! Health endpoints
//!
//! - `/health` - process is up, with version
//! - `/health/live` - liveness, with uptime
//! - `/health/ready` - readiness; pings the database
//! - `/health/version` - build information

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, error};

use crate::AppState;

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Readiness of one dependency
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthDetail {
    pub status: HealthStatus,
    pub latency_ms: Option<u128>,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

static STARTED: OnceLock<Instant> = OnceLock::new();

/// Records the process start; the first caller wins.
pub fn mark_started() {
    STARTED.get_or_init(Instant::now);
}

fn uptime_seconds() -> u64 {
    STARTED.get().map_or(0, |started| started.elapsed().as_secs())
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Simple health check response that doesn't require state
pub async fn simple_health_check() -> impl IntoResponse {
    debug!("Health check endpoint called");

    (
        StatusCode::OK,
        Json(json!({
            "status": HealthStatus::Up,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Liveness check endpoint
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": uptime_seconds(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let database = match state.db.ping().await {
        Ok(()) => HealthDetail {
            status: HealthStatus::Up,
            latency_ms: Some(started.elapsed().as_millis()),
            message: None,
            timestamp: Utc::now(),
        },
        Err(e) => {
            error!(error = %e, "Database health check failed");
            HealthDetail {
                status: HealthStatus::Down,
                latency_ms: None,
                message: Some("database unreachable".to_string()),
                timestamp: Utc::now(),
            }
        }
    };

    let ready = database.status == HealthStatus::Up;
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "ready": ready,
            "details": { "database": database },
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Creates router with health check endpoints
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(simple_health_check))
        .route("/live", get(liveness_check))
        .route("/ready", get(readiness_check))
        .route("/version", get(version_info))
}
