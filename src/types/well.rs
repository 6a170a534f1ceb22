//! Well records and their create/update payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::numeric::{deserialize_some, opt_f64, NumberLike};
use super::parse_timestamp;

/// Default WITSML version tag for new wells and data entries.
pub const DEFAULT_WITSML_VERSION: &str = "2.1";

/// Lifecycle stage of a well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WellStatus {
    #[default]
    #[serde(alias = "PLANNED")]
    Planned,
    #[serde(alias = "DRILLING")]
    Drilling,
    #[serde(alias = "PRODUCING")]
    Producing,
    #[serde(alias = "COMPLETED")]
    Completed,
}

impl WellStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Drilling => "drilling",
            Self::Producing => "producing",
            Self::Completed => "completed",
        }
    }

    /// Parse a status filter value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planned" => Some(Self::Planned),
            "drilling" => Some(Self::Drilling),
            "producing" => Some(Self::Producing),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for WellStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored well record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Well {
    pub id: String,
    pub name: String,
    pub location: String,
    pub field: Option<String>,
    pub status: WellStatus,
    /// Current measured depth (m)
    pub depth: f64,
    /// Planned total depth (m)
    pub target_depth: Option<f64>,
    /// Bottom-hole temperature (°C)
    pub temperature: Option<f64>,
    /// Bottom-hole pressure (psi)
    pub pressure: Option<f64>,
    /// Production flow rate (bbl/d)
    pub flow_rate: Option<f64>,
    pub witsml_version: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub operator: Option<String>,
    pub contractor: Option<String>,
    pub spud_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp, refreshed on every successful write.
    pub updated_at: DateTime<Utc>,
}

impl Well {
    /// Materialize a validated [`NewWell`] into a record.
    pub fn from_new(id: String, new: NewWell, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            location: new.location,
            field: new.field,
            status: new.status,
            depth: new.depth,
            target_depth: new.target_depth,
            temperature: new.temperature,
            pressure: new.pressure,
            flow_rate: new.flow_rate,
            witsml_version: new.witsml_version,
            latitude: new.latitude,
            longitude: new.longitude,
            operator: new.operator,
            contractor: new.contractor,
            spud_date: new.spud_date,
            completion_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch into this record. Absent fields are left untouched.
    pub fn apply_patch(&mut self, patch: WellPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(field) = patch.field {
            self.field = field;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(depth) = patch.depth {
            self.depth = depth;
        }
        if let Some(target_depth) = patch.target_depth {
            self.target_depth = target_depth;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(pressure) = patch.pressure {
            self.pressure = pressure;
        }
        if let Some(flow_rate) = patch.flow_rate {
            self.flow_rate = flow_rate;
        }
        if let Some(version) = patch.witsml_version {
            self.witsml_version = version;
        }
        if let Some(latitude) = patch.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = patch.longitude {
            self.longitude = longitude;
        }
        if let Some(operator) = patch.operator {
            self.operator = operator;
        }
        if let Some(contractor) = patch.contractor {
            self.contractor = contractor;
        }
        if let Some(spud_date) = patch.spud_date {
            self.spud_date = spud_date;
        }
        if let Some(completion_date) = patch.completion_date {
            self.completion_date = completion_date;
        }
        self.updated_at = now;
    }
}

// ============================================================================
// Create
// ============================================================================

/// Validated input for creating a well.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWell {
    pub name: String,
    pub location: String,
    pub field: Option<String>,
    pub status: WellStatus,
    pub depth: f64,
    pub target_depth: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub flow_rate: Option<f64>,
    pub witsml_version: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub operator: Option<String>,
    pub contractor: Option<String>,
    pub spud_date: Option<DateTime<Utc>>,
}

impl NewWell {
    /// Minimal well with the required fields set.
    pub fn new(name: impl Into<String>, location: impl Into<String>, depth: f64) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            field: None,
            status: WellStatus::default(),
            depth,
            target_depth: None,
            temperature: None,
            pressure: None,
            flow_rate: None,
            witsml_version: DEFAULT_WITSML_VERSION.to_string(),
            latitude: None,
            longitude: None,
            operator: None,
            contractor: None,
            spud_date: None,
        }
    }

    /// Rules the add-well form enforces before submitting.
    ///
    /// Returns every violated rule. The store does not apply these; the API
    /// applies them only when `api.enforce_form_rules` is set.
    pub fn form_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.depth < 0.0 {
            violations.push(format!("depth must be >= 0 (got {})", self.depth));
        }
        if let Some(target) = self.target_depth {
            if target < 0.0 {
                violations.push(format!("targetDepth must be >= 0 (got {target})"));
            } else if self.depth > target {
                violations.push(format!(
                    "depth ({}) must not exceed targetDepth ({target})",
                    self.depth
                ));
            }
        }
        violations
    }
}

/// Raw `POST /wells` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWellRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub field: Option<String>,
    pub status: Option<WellStatus>,
    pub depth: Option<NumberLike>,
    pub target_depth: Option<NumberLike>,
    pub temperature: Option<NumberLike>,
    pub pressure: Option<NumberLike>,
    pub flow_rate: Option<NumberLike>,
    pub witsml_version: Option<String>,
    pub latitude: Option<NumberLike>,
    pub longitude: Option<NumberLike>,
    pub operator: Option<String>,
    pub contractor: Option<String>,
    pub spud_date: Option<String>,
}

impl CreateWellRequest {
    /// Check required fields and coerce numeric/date inputs.
    pub fn validate(self) -> Result<NewWell, String> {
        let name = self.name.filter(|s| !s.trim().is_empty());
        let location = self.location.filter(|s| !s.trim().is_empty());
        let (Some(name), Some(location), Some(depth)) = (name, location, self.depth) else {
            return Err("Name, location, and depth are required".to_string());
        };

        Ok(NewWell {
            name,
            location,
            field: self.field,
            status: self.status.unwrap_or_default(),
            depth: depth.to_f64("depth")?,
            target_depth: opt_f64(self.target_depth.as_ref(), "targetDepth")?,
            temperature: opt_f64(self.temperature.as_ref(), "temperature")?,
            pressure: opt_f64(self.pressure.as_ref(), "pressure")?,
            flow_rate: opt_f64(self.flow_rate.as_ref(), "flowRate")?,
            witsml_version: self
                .witsml_version
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WITSML_VERSION.to_string()),
            latitude: opt_f64(self.latitude.as_ref(), "latitude")?,
            longitude: opt_f64(self.longitude.as_ref(), "longitude")?,
            operator: self.operator,
            contractor: self.contractor,
            spud_date: self
                .spud_date
                .as_deref()
                .map(|s| parse_timestamp(s, "spudDate"))
                .transpose()?,
        })
    }
}

// ============================================================================
// Update
// ============================================================================

/// Validated partial update. Outer `None` leaves a field untouched; for
/// nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WellPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub field: Option<Option<String>>,
    pub status: Option<WellStatus>,
    pub depth: Option<f64>,
    pub target_depth: Option<Option<f64>>,
    pub temperature: Option<Option<f64>>,
    pub pressure: Option<Option<f64>>,
    pub flow_rate: Option<Option<f64>>,
    pub witsml_version: Option<String>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
    pub operator: Option<Option<String>>,
    pub contractor: Option<Option<String>>,
    pub spud_date: Option<Option<DateTime<Utc>>>,
    pub completion_date: Option<Option<DateTime<Utc>>>,
}

/// Raw `PUT /wells/:id` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWellRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub field: Option<Option<String>>,
    pub status: Option<WellStatus>,
    pub depth: Option<NumberLike>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub target_depth: Option<Option<NumberLike>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub temperature: Option<Option<NumberLike>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub pressure: Option<Option<NumberLike>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub flow_rate: Option<Option<NumberLike>>,
    pub witsml_version: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub latitude: Option<Option<NumberLike>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub longitude: Option<Option<NumberLike>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub operator: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub contractor: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub spud_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub completion_date: Option<Option<String>>,
}

fn nullable_f64(
    value: Option<Option<NumberLike>>,
    field: &str,
) -> Result<Option<Option<f64>>, String> {
    value
        .map(|inner| inner.map(|n| n.to_f64(field)).transpose())
        .transpose()
}

fn nullable_date(
    value: Option<Option<String>>,
    field: &str,
) -> Result<Option<Option<DateTime<Utc>>>, String> {
    value
        .map(|inner| inner.map(|s| parse_timestamp(&s, field)).transpose())
        .transpose()
}

impl UpdateWellRequest {
    /// Coerce numeric/date inputs. Required string fields may not be blanked.
    pub fn validate(self) -> Result<WellPatch, String> {
        if self.name.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err("name must not be empty".to_string());
        }
        if self.location.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err("location must not be empty".to_string());
        }

        Ok(WellPatch {
            name: self.name,
            location: self.location,
            field: self.field,
            status: self.status,
            depth: self.depth.map(|d| d.to_f64("depth")).transpose()?,
            target_depth: nullable_f64(self.target_depth, "targetDepth")?,
            temperature: nullable_f64(self.temperature, "temperature")?,
            pressure: nullable_f64(self.pressure, "pressure")?,
            flow_rate: nullable_f64(self.flow_rate, "flowRate")?,
            witsml_version: self.witsml_version,
            latitude: nullable_f64(self.latitude, "latitude")?,
            longitude: nullable_f64(self.longitude, "longitude")?,
            operator: self.operator,
            contractor: self.contractor,
            spud_date: nullable_date(self.spud_date, "spudDate")?,
            completion_date: nullable_date(self.completion_date, "completionDate")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> CreateWellRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_create_requires_name_location_depth() {
        let missing_location = request(serde_json::json!({"name": "A", "depth": 10}));
        assert!(missing_location.validate().is_err());

        let blank_name = request(serde_json::json!({"name": " ", "location": "X", "depth": 10}));
        assert!(blank_name.validate().is_err());

        let no_depth = request(serde_json::json!({"name": "A", "location": "X"}));
        assert!(no_depth.validate().is_err());
    }

    #[test]
    fn test_create_defaults_and_string_numbers() {
        let new = request(serde_json::json!({
            "name": "Well-A-01",
            "location": "South Pars Field",
            "depth": "3250",
            "targetDepth": 4100,
            "spudDate": "2023-10-15"
        }))
        .validate()
        .unwrap();

        assert_eq!(new.depth, 3250.0);
        assert_eq!(new.target_depth, Some(4100.0));
        assert_eq!(new.status, WellStatus::Planned);
        assert_eq!(new.witsml_version, DEFAULT_WITSML_VERSION);
        assert!(new.spud_date.is_some());
    }

    #[test]
    fn test_negative_depth_passes_validation_but_not_form_rules() {
        let new = request(serde_json::json!({"name": "A", "location": "X", "depth": -5}))
            .validate()
            .unwrap();
        assert_eq!(new.depth, -5.0);
        assert_eq!(new.form_violations().len(), 1);
    }

    #[test]
    fn test_form_rules_depth_beyond_target() {
        let mut new = NewWell::new("A", "X", 5000.0);
        new.target_depth = Some(4000.0);
        let violations = new.form_violations();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("targetDepth"));

        new.depth = 3000.0;
        assert!(new.form_violations().is_empty());
    }

    #[test]
    fn test_status_accepts_upper_case() {
        let status: WellStatus = serde_json::from_str("\"DRILLING\"").unwrap();
        assert_eq!(status, WellStatus::Drilling);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"drilling\"");
        assert_eq!(WellStatus::parse("Producing"), Some(WellStatus::Producing));
    }

    #[test]
    fn test_patch_merges_and_clears() {
        let now = Utc::now();
        let mut new = NewWell::new("A", "X", 100.0);
        new.temperature = Some(80.0);
        new.pressure = Some(4000.0);
        let mut well = Well::from_new("w1".to_string(), new, now);

        let patch: UpdateWellRequest = serde_json::from_value(serde_json::json!({
            "depth": 150,
            "temperature": null,
            "status": "drilling"
        }))
        .unwrap();
        let later = now + chrono::Duration::seconds(5);
        well.apply_patch(patch.validate().unwrap(), later);

        assert_eq!(well.depth, 150.0);
        assert_eq!(well.temperature, None);
        assert_eq!(well.pressure, Some(4000.0));
        assert_eq!(well.status, WellStatus::Drilling);
        assert_eq!(well.name, "A");
        assert_eq!(well.updated_at, later);
    }
}
