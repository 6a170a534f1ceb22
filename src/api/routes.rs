//! API route definitions
//!
//! Endpoints mounted under `/api`:
//! - /health - Store liveness and relay occupancy
//! - /auth/login - Credential check
//! - /wells, /wells/:id - Well CRUD
//! - /wells/:id/{parameters,logs,operations,witsml} - Child records
//! - /wells/:id/witsml/sample - WITSML template documents

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create all `/api` routes
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/login", post(handlers::login))
        // Wells
        .route("/wells", get(handlers::list_wells).post(handlers::create_well))
        .route(
            "/wells/:id",
            get(handlers::get_well)
                .put(handlers::update_well)
                .delete(handlers::delete_well),
        )
        // Child records
        .route(
            "/wells/:id/parameters",
            get(handlers::list_parameters).post(handlers::create_parameter),
        )
        .route(
            "/wells/:id/logs",
            get(handlers::list_logs).post(handlers::create_log),
        )
        .route(
            "/wells/:id/operations",
            get(handlers::list_operations).post(handlers::create_operation),
        )
        // WITSML
        .route(
            "/wells/:id/witsml",
            get(handlers::list_witsml).post(handlers::create_witsml),
        )
        .route("/wells/:id/witsml/sample", get(handlers::sample_witsml))
        .with_state(state)
}

/// Legacy health endpoint at root level
pub fn legacy_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::InMemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        AppState::new(Arc::new(InMemoryStore::new()), AppConfig::default())
    }

    #[tokio::test]
    async fn test_api_routes_health() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_wells() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/wells")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_routes_unknown_well() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/wells/nope/logs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_legacy_health() {
        let app = legacy_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
