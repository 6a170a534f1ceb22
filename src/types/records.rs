//! Child records attached to a well: drilling parameters, logs, operations
//! and WITSML data entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::numeric::NumberLike;
use super::parse_timestamp;
use super::well::DEFAULT_WITSML_VERSION;

// ============================================================================
// Drilling parameters
// ============================================================================

/// Classification of a drilling parameter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParameterStatus {
    #[default]
    #[serde(alias = "NORMAL")]
    Normal,
    #[serde(alias = "WARNING")]
    Warning,
    #[serde(alias = "CRITICAL")]
    Critical,
}

/// A persisted drilling parameter reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillingParameter {
    pub id: String,
    pub well_id: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: ParameterStatus,
    pub timestamp: DateTime<Utc>,
}

/// Validated input for a new drilling parameter row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDrillingParameter {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub status: ParameterStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParameterRequest {
    pub name: Option<String>,
    pub value: Option<NumberLike>,
    pub unit: Option<String>,
    pub status: Option<ParameterStatus>,
}

impl CreateParameterRequest {
    pub fn validate(self) -> Result<NewDrillingParameter, String> {
        let name = self.name.filter(|s| !s.trim().is_empty());
        let unit = self.unit.filter(|s| !s.trim().is_empty());
        let (Some(name), Some(value), Some(unit)) = (name, self.value, unit) else {
            return Err("Name, value, and unit are required".to_string());
        };
        Ok(NewDrillingParameter {
            name,
            value: value.to_f64("value")?,
            unit,
            status: self.status.unwrap_or_default(),
        })
    }
}

// ============================================================================
// Well logs
// ============================================================================

/// A single depth-indexed log sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellLog {
    pub id: String,
    pub well_id: String,
    pub log_type: String,
    pub depth: f64,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWellLog {
    pub log_type: String,
    pub depth: f64,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogRequest {
    pub log_type: Option<String>,
    pub depth: Option<NumberLike>,
    pub value: Option<NumberLike>,
    pub unit: Option<String>,
}

impl CreateLogRequest {
    pub fn validate(self) -> Result<NewWellLog, String> {
        let log_type = self.log_type.filter(|s| !s.trim().is_empty());
        let unit = self.unit.filter(|s| !s.trim().is_empty());
        let (Some(log_type), Some(depth), Some(value), Some(unit)) =
            (log_type, self.depth, self.value, unit)
        else {
            return Err("Log type, depth, value, and unit are required".to_string());
        };
        Ok(NewWellLog {
            log_type,
            depth: depth.to_f64("depth")?,
            value: value.to_f64("value")?,
            unit,
        })
    }
}

// ============================================================================
// Operations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    #[serde(alias = "PLANNED")]
    Planned,
    #[serde(alias = "IN_PROGRESS")]
    InProgress,
    #[serde(alias = "COMPLETED")]
    Completed,
    #[serde(alias = "CANCELLED")]
    Cancelled,
}

impl OperationStatus {
    /// Parse a status filter value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planned" => Some(Self::Planned),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A field operation (drilling run, casing, testing, ...) on a well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub well_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: OperationStatus,
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    pub kind: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: OperationStatus,
    pub result: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperationRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<OperationStatus>,
    pub result: Option<String>,
}

impl CreateOperationRequest {
    pub fn validate(self) -> Result<NewOperation, String> {
        let kind = self.kind.filter(|s| !s.trim().is_empty());
        let start = self.start_time.filter(|s| !s.trim().is_empty());
        let (Some(kind), Some(start)) = (kind, start) else {
            return Err("Type and start time are required".to_string());
        };
        Ok(NewOperation {
            kind,
            description: self.description,
            start_time: parse_timestamp(&start, "startTime")?,
            end_time: self
                .end_time
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| parse_timestamp(s, "endTime"))
                .transpose()?,
            status: self.status.unwrap_or_default(),
            result: self.result,
        })
    }
}

// ============================================================================
// WITSML data entries
// ============================================================================

/// A stored WITSML payload for a well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitsmlDataEntry {
    pub id: String,
    pub well_id: String,
    /// drilling, production, geology, completion, testing, ...
    pub data_type: String,
    pub version: String,
    pub xml_data: Option<String>,
    /// Serialized JSON document.
    pub json_data: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWitsmlEntry {
    pub data_type: String,
    pub version: String,
    pub xml_data: Option<String>,
    pub json_data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWitsmlRequest {
    pub data_type: Option<String>,
    pub version: Option<String>,
    pub xml_data: Option<String>,
    pub json_data: Option<serde_json::Value>,
}

impl CreateWitsmlRequest {
    pub fn validate(self) -> Result<NewWitsmlEntry, String> {
        let Some(data_type) = self.data_type.filter(|s| !s.trim().is_empty()) else {
            return Err("Data type is required".to_string());
        };
        let json_data = self
            .json_data
            .filter(|v| !v.is_null())
            .map(|v| serde_json::to_string(&v))
            .transpose()
            .map_err(|e| format!("jsonData could not be serialized: {e}"))?;
        Ok(NewWitsmlEntry {
            data_type,
            version: self
                .version
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WITSML_VERSION.to_string()),
            xml_data: self.xml_data.filter(|x| !x.trim().is_empty()),
            json_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_defaults_to_normal() {
        let req: CreateParameterRequest = serde_json::from_value(serde_json::json!({
            "name": "ROP", "value": "27.5", "unit": "m/h"
        }))
        .unwrap();
        let p = req.validate().unwrap();
        assert_eq!(p.status, ParameterStatus::Normal);
        assert_eq!(p.value, 27.5);
    }

    #[test]
    fn test_parameter_requires_unit() {
        let req: CreateParameterRequest =
            serde_json::from_value(serde_json::json!({"name": "ROP", "value": 1})).unwrap();
        assert_eq!(req.validate().unwrap_err(), "Name, value, and unit are required");
    }

    #[test]
    fn test_log_requires_all_fields() {
        let req: CreateLogRequest = serde_json::from_value(serde_json::json!({
            "logType": "gamma", "depth": 100
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_operation_parses_times_and_status() {
        let req: CreateOperationRequest = serde_json::from_value(serde_json::json!({
            "type": "casing",
            "startTime": "2024-03-01T08:00:00Z",
            "endTime": "2024-03-02",
            "status": "IN_PROGRESS"
        }))
        .unwrap();
        let op = req.validate().unwrap();
        assert_eq!(op.kind, "casing");
        assert_eq!(op.status, OperationStatus::InProgress);
        assert!(op.end_time.unwrap() > op.start_time);
    }

    #[test]
    fn test_operation_requires_start_time() {
        let req: CreateOperationRequest =
            serde_json::from_value(serde_json::json!({"type": "casing"})).unwrap();
        assert_eq!(req.validate().unwrap_err(), "Type and start time are required");
    }

    #[test]
    fn test_witsml_json_payload_is_stringified() {
        let req: CreateWitsmlRequest = serde_json::from_value(serde_json::json!({
            "dataType": "drilling",
            "jsonData": {"rop": 25.5}
        }))
        .unwrap();
        let entry = req.validate().unwrap();
        assert_eq!(entry.version, DEFAULT_WITSML_VERSION);
        assert_eq!(entry.json_data.as_deref(), Some(r#"{"rop":25.5}"#));
        assert!(entry.xml_data.is_none());
    }
}
