//! Child record endpoints: drilling parameters, well logs, operations

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use crate::api::error::ApiError;
use crate::api::extract::{parse_limit, parse_number, ApiJson, ApiPath, ApiQuery};
use crate::config::defaults;
use crate::storage::{LogQuery, OperationQuery, ParameterQuery};
use crate::types::{
    CreateLogRequest, CreateOperationRequest, CreateParameterRequest, DrillingParameter,
    Operation, OperationStatus, WellLog,
};

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn offset(value: Option<&str>) -> Result<usize, ApiError> {
    Ok(parse_number::<usize>(value, "offset")?.unwrap_or(0))
}

// ============================================================================
// Drilling parameters
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ParameterListParams {
    pub name: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ParameterListParams {
    fn into_query(self, max: usize) -> Result<ParameterQuery, ApiError> {
        Ok(ParameterQuery {
            limit: parse_limit(self.limit.as_deref(), defaults::PARAMETER_PAGE_SIZE, max)?,
            offset: offset(self.offset.as_deref())?,
            name: non_blank(self.name),
        })
    }
}

/// GET /api/wells/:id/parameters - Newest first
pub async fn list_parameters(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<ParameterListParams>,
) -> Result<Json<Vec<DrillingParameter>>, ApiError> {
    let query = params.into_query(state.config.api.max_page_size)?;
    state
        .store
        .list_parameters(&well_id, &query)
        .map(Json)
        .map_err(|e| ApiError::from_store(e, "Failed to fetch drilling parameters"))
}

/// POST /api/wells/:id/parameters
pub async fn create_parameter(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiJson(body): ApiJson<CreateParameterRequest>,
) -> Result<(StatusCode, Json<DrillingParameter>), ApiError> {
    let new = body.validate().map_err(ApiError::Validation)?;
    let row = state
        .store
        .create_parameter(&well_id, new)
        .map_err(|e| ApiError::from_store(e, "Failed to create drilling parameter"))?;
    debug!(well_id = %well_id, name = %row.name, value = row.value, "Drilling parameter recorded");
    Ok((StatusCode::CREATED, Json(row)))
}

// ============================================================================
// Well logs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogListParams {
    #[serde(rename = "type")]
    pub log_type: Option<String>,
    pub min_depth: Option<String>,
    pub max_depth: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl LogListParams {
    fn into_query(self, max: usize) -> Result<LogQuery, ApiError> {
        Ok(LogQuery {
            min_depth: parse_number(self.min_depth.as_deref(), "minDepth")?,
            max_depth: parse_number(self.max_depth.as_deref(), "maxDepth")?,
            limit: parse_limit(self.limit.as_deref(), defaults::LOG_PAGE_SIZE, max)?,
            offset: offset(self.offset.as_deref())?,
            log_type: non_blank(self.log_type),
        })
    }
}

/// GET /api/wells/:id/logs - Depth ascending, then newest first
pub async fn list_logs(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<LogListParams>,
) -> Result<Json<Vec<WellLog>>, ApiError> {
    let query = params.into_query(state.config.api.max_page_size)?;
    state
        .store
        .list_logs(&well_id, &query)
        .map(Json)
        .map_err(|e| ApiError::from_store(e, "Failed to fetch well logs"))
}

/// POST /api/wells/:id/logs
pub async fn create_log(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiJson(body): ApiJson<CreateLogRequest>,
) -> Result<(StatusCode, Json<WellLog>), ApiError> {
    let new = body.validate().map_err(ApiError::Validation)?;
    let row = state
        .store
        .create_log(&well_id, new)
        .map_err(|e| ApiError::from_store(e, "Failed to create well log"))?;
    debug!(well_id = %well_id, log_type = %row.log_type, depth = row.depth, "Well log recorded");
    Ok((StatusCode::CREATED, Json(row)))
}

// ============================================================================
// Operations
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OperationListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl OperationListParams {
    fn into_query(self, max: usize) -> Result<OperationQuery, ApiError> {
        let status = match non_blank(self.status) {
            None => None,
            Some(raw) => Some(
                OperationStatus::parse(&raw)
                    .ok_or_else(|| ApiError::Validation(format!("Invalid status: {raw}")))?,
            ),
        };
        Ok(OperationQuery {
            kind: non_blank(self.kind),
            status,
            limit: parse_limit(self.limit.as_deref(), defaults::OPERATION_PAGE_SIZE, max)?,
            offset: offset(self.offset.as_deref())?,
        })
    }
}

/// GET /api/wells/:id/operations - Start time descending
pub async fn list_operations(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<OperationListParams>,
) -> Result<Json<Vec<Operation>>, ApiError> {
    let query = params.into_query(state.config.api.max_page_size)?;
    state
        .store
        .list_operations(&well_id, &query)
        .map(Json)
        .map_err(|e| ApiError::from_store(e, "Failed to fetch operations"))
}

/// POST /api/wells/:id/operations
pub async fn create_operation(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiJson(body): ApiJson<CreateOperationRequest>,
) -> Result<(StatusCode, Json<Operation>), ApiError> {
    let new = body.validate().map_err(ApiError::Validation)?;
    let row = state
        .store
        .create_operation(&well_id, new)
        .map_err(|e| ApiError::from_store(e, "Failed to create operation"))?;
    debug!(well_id = %well_id, kind = %row.kind, "Operation recorded");
    Ok((StatusCode::CREATED, Json(row)))
}
