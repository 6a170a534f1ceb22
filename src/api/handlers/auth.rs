//! Login endpoint

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::AppState;
use crate::api::error::ApiError;
use crate::api::extract::ApiJson;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
    pub username: String,
}

/// POST /api/auth/login - Check credentials against the configured verifier
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    if state.verifier.verify(&username, &password) {
        info!(username = %username, "Login accepted");
        Ok(Json(LoginResponse {
            authenticated: true,
            username,
        }))
    } else {
        warn!(username = %username, "Login rejected");
        Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ))
    }
}
