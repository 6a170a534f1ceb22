//! REST API module using Axum
//!
//! Provides HTTP endpoints for the well telemetry service:
//! - `/api/*` well records, child records and WITSML documents
//! - `/ws` live-update relay
//! - `/health` legacy health check at the root

pub mod error;
pub mod extract;
pub mod handlers;
mod routes;
pub mod ws;

pub use error::ApiError;
pub use handlers::AppState;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// `server.cors_origins` lists the origins allowed for cross-origin calls.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer;
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    tracing::info!(origins = ?origins, "CORS: allowing configured origins");
    layer.allow_origin(allowed)
}

/// Create the complete application router.
pub fn create_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors_origins);

    Router::new()
        .nest("/api", routes::api_routes(state.clone()))
        .route("/ws", get(ws::ws_handler).with_state(state.clone()))
        // Legacy health endpoint at /health
        .merge(routes::legacy_routes(state))
        // Middleware
        .layer(RequestBodyLimitLayer::new(defaults::MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(
            defaults::REQUEST_TIMEOUT_SECS,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
