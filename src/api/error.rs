//! API error type
//!
//! Every handler failure becomes `{ "error": "<message>" }` with the status
//! code of its variant. Internal failures are logged with their cause; the
//! caller only sees the generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// Unknown resource (404)
    #[error("{0}")]
    NotFound(String),

    /// Login rejected (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Unexpected failure (500). Holds the public message only.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log `cause` and return a 500 carrying only `public`.
    pub fn internal(public: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "{public}");
        Self::Internal(public.to_string())
    }

    /// Map a store failure. `NotFound` and `Invalid` pass through; backend
    /// failures become a 500 with `context` as the public message.
    pub fn from_store(err: StoreError, context: &str) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            StoreError::Invalid(msg) => Self::Validation(msg),
            other => Self::internal(context, other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(format!("Invalid path: {}", rejection.body_text()))
    }
}
