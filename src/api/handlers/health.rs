//! Health endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::AppState;
use crate::relay::RelayStats;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub database: &'static str,
    /// Storage backend name
    pub backend: &'static str,
    pub uptime_seconds: u64,
    pub relay: RelayStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health and /api/health - Store liveness plus relay occupancy.
/// Returns 500 with `status: "unhealthy"` when the store does not answer.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let ping = state.store.ping();
    let healthy = ping.is_ok();
    if let Err(e) = &ping {
        warn!(backend = state.store.backend_name(), error = %e, "Health check failed");
    }

    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        database: if healthy { "connected" } else { "unavailable" },
        backend: state.store.backend_name(),
        uptime_seconds: state.uptime_secs(),
        relay: state.relay.stats(),
        error: ping.err().map(|e| e.to_string()),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(body)).into_response()
}
