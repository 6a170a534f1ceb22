//! Well endpoints: list, create, fetch, update, delete

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use crate::api::error::ApiError;
use crate::api::extract::{parse_limit, parse_number, ApiJson, ApiPath, ApiQuery};
use crate::config::ApiConfig;
use crate::storage::WellQuery;
use crate::types::{CreateWellRequest, UpdateWellRequest, Well, WellDetail, WellPage, WellStatus};

/// Plain `{ "message": ... }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Raw `GET /wells` query string. Parsed by [`WellListParams::into_query`].
#[derive(Debug, Default, Deserialize)]
pub struct WellListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub field: Option<String>,
}

impl WellListParams {
    pub fn into_query(self, api: &ApiConfig) -> Result<WellQuery, ApiError> {
        let page = match parse_number::<usize>(self.page.as_deref(), "page")? {
            None => 1,
            Some(0) => return Err(ApiError::Validation("page must be >= 1".to_string())),
            Some(page) => page,
        };
        let limit = parse_limit(self.limit.as_deref(), api.default_page_size, api.max_page_size)?;
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => Some(
                WellStatus::parse(raw)
                    .ok_or_else(|| ApiError::Validation(format!("Invalid status: {raw}")))?,
            ),
        };
        let field = self.field.filter(|f| !f.trim().is_empty());

        Ok(WellQuery {
            page,
            limit,
            status,
            field,
        })
    }
}

/// GET /api/wells - Paginated well list with latest parameter and operation
pub async fn list_wells(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<WellListParams>,
) -> Result<Json<WellPage>, ApiError> {
    let query = params.into_query(&state.config.api)?;
    state
        .store
        .list_wells(&query)
        .map(Json)
        .map_err(|e| ApiError::from_store(e, "Failed to fetch wells"))
}

/// POST /api/wells - Create a well
pub async fn create_well(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateWellRequest>,
) -> Result<(StatusCode, Json<Well>), ApiError> {
    let new = body.validate().map_err(ApiError::Validation)?;

    if state.config.api.enforce_form_rules {
        let violations = new.form_violations();
        if !violations.is_empty() {
            return Err(ApiError::Validation(violations.join("; ")));
        }
    }

    let well = state
        .store
        .create_well(new)
        .map_err(|e| ApiError::from_store(e, "Failed to create well"))?;
    info!(well_id = %well.id, name = %well.name, status = %well.status, "Well created");
    Ok((StatusCode::CREATED, Json(well)))
}

/// GET /api/wells/:id - Well with recent related records
pub async fn get_well(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<WellDetail>, ApiError> {
    state
        .store
        .get_well(&id)
        .map(Json)
        .map_err(|e| ApiError::from_store(e, "Failed to fetch well"))
}

/// PUT /api/wells/:id - Partial update
pub async fn update_well(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateWellRequest>,
) -> Result<Json<Well>, ApiError> {
    let patch = body.validate().map_err(ApiError::Validation)?;
    let well = state
        .store
        .update_well(&id, patch)
        .map_err(|e| ApiError::from_store(e, "Failed to update well"))?;
    info!(well_id = %id, "Well updated");
    Ok(Json(well))
}

/// DELETE /api/wells/:id - Remove a well and its records
pub async fn delete_well(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .store
        .delete_well(&id)
        .map_err(|e| ApiError::from_store(e, "Failed to delete well"))?;
    info!(well_id = %id, "Well deleted");
    Ok(Json(MessageResponse {
        message: "Well deleted successfully".to_string(),
    }))
}
