//! WITSML endpoints: stored entries (JSON or XML export) and sample documents

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use crate::api::error::ApiError;
use crate::api::extract::{parse_limit, ApiJson, ApiPath, ApiQuery};
use crate::config::defaults;
use crate::storage::WitsmlQuery;
use crate::types::{CreateWitsmlRequest, WitsmlDataEntry};
use crate::witsml::{self, Format};

const XML_CONTENT_TYPE: &str = "application/xml";

fn xml_response(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct WitsmlListParams {
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    pub format: Option<String>,
    pub limit: Option<String>,
}

/// GET /api/wells/:id/witsml - Newest first; `?format=xml` exports a
/// `<wells>` document instead of JSON
pub async fn list_witsml(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<WitsmlListParams>,
) -> Result<Response, ApiError> {
    let query = WitsmlQuery {
        data_type: params.data_type.filter(|t| !t.trim().is_empty()),
        limit: parse_limit(
            params.limit.as_deref(),
            defaults::WITSML_PAGE_SIZE,
            state.config.api.max_page_size,
        )?,
    };
    let entries = state
        .store
        .list_witsml(&well_id, &query)
        .map_err(|e| ApiError::from_store(e, "Failed to fetch WITSML data"))?;

    match Format::parse(params.format.as_deref()) {
        Format::Json => Ok(Json(entries).into_response()),
        Format::Xml => {
            let xml = witsml::export_entries_xml(&entries)
                .map_err(|e| ApiError::internal("Failed to fetch WITSML data", e))?;
            Ok(xml_response(xml))
        }
    }
}

/// POST /api/wells/:id/witsml
pub async fn create_witsml(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiJson(body): ApiJson<CreateWitsmlRequest>,
) -> Result<(StatusCode, Json<WitsmlDataEntry>), ApiError> {
    let new = body.validate().map_err(ApiError::Validation)?;
    let entry = state
        .store
        .create_witsml(&well_id, new)
        .map_err(|e| ApiError::from_store(e, "Failed to create WITSML data"))?;
    debug!(well_id = %well_id, data_type = %entry.data_type, "WITSML entry stored");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Default, Deserialize)]
pub struct WitsmlSampleParams {
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    pub format: Option<String>,
}

/// GET /api/wells/:id/witsml/sample - Template document for a data type.
/// Defaults to `type=drilling`, `format=xml`.
pub async fn sample_witsml(
    State(state): State<AppState>,
    ApiPath(well_id): ApiPath<String>,
    ApiQuery(params): ApiQuery<WitsmlSampleParams>,
) -> Result<Response, ApiError> {
    state
        .store
        .require_well(&well_id)
        .map_err(|e| ApiError::from_store(e, "Failed to build WITSML sample"))?;

    let data_type = params
        .data_type
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "drilling".to_string());
    let now = Utc::now();

    match params.format.as_deref() {
        Some(f) if f.eq_ignore_ascii_case("json") => {
            Ok(Json(witsml::sample_json(&data_type, &well_id, now)).into_response())
        }
        _ => {
            let xml = witsml::sample_xml(&data_type, &well_id, now)
                .map_err(|e| ApiError::internal("Failed to build WITSML sample", e))?;
            Ok(xml_response(xml))
        }
    }
}
