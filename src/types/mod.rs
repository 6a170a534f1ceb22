//! Domain types for well telemetry
//!
//! - [`Well`]: the well aggregate with its create/patch payloads
//! - [`DrillingParameter`], [`WellLog`], [`Operation`], [`WitsmlDataEntry`]:
//!   append-only child records
//! - [`WellSummary`] / [`WellDetail`]: read models returned by the store

mod numeric;
mod records;
mod well;

pub use numeric::*;
pub use records::*;
pub use well::*;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Parse an ISO-8601 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("{field} must be an ISO-8601 date or timestamp, got {value:?}"))
}

// ============================================================================
// Read models
// ============================================================================

/// List entry: a well with its most recent reading and operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellSummary {
    #[serde(flatten)]
    pub well: Well,
    pub drilling_parameters: Vec<DrillingParameter>,
    pub operations: Vec<Operation>,
}

/// A single well with its recent related records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellDetail {
    #[serde(flatten)]
    pub well: Well,
    pub drilling_parameters: Vec<DrillingParameter>,
    pub witsml_data: Vec<WitsmlDataEntry>,
    pub well_logs: Vec<WellLog>,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        Self {
            page,
            limit,
            total,
            pages: if limit == 0 { 0 } else { total.div_ceil(limit) },
        }
    }
}

/// One page of `GET /wells`.
#[derive(Debug, Clone, Serialize)]
pub struct WellPage {
    pub data: Vec<WellSummary>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_forms() {
        let full = parse_timestamp("2023-10-15T06:30:00Z", "spudDate").unwrap();
        let date = parse_timestamp("2023-10-15", "spudDate").unwrap();
        assert_eq!(full.date_naive(), date.date_naive());
        assert!(parse_timestamp("last tuesday", "spudDate").is_err());
    }

    #[test]
    fn test_pagination_pages_round_up() {
        assert_eq!(Pagination::new(1, 10, 21).pages, 3);
        assert_eq!(Pagination::new(1, 10, 20).pages, 2);
        assert_eq!(Pagination::new(1, 10, 0).pages, 0);
    }
}
