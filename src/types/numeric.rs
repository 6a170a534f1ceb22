//! Lenient numeric inputs
//!
//! Dashboard forms post numbers either as JSON numbers or as strings typed
//! into text inputs (`"3250.5"`). Both are accepted; anything else is a
//! validation failure.

use serde::{Deserialize, Deserializer, Serialize};

/// A JSON number or a string holding one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    /// Resolve to a finite `f64`, naming `field` in the error.
    pub fn to_f64(&self, field: &str) -> Result<f64, String> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("{field} must be a number, got {s:?}"))?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("{field} must be a finite number"))
        }
    }
}

impl From<f64> for NumberLike {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Resolve an optional lenient number.
pub fn opt_f64(value: Option<&NumberLike>, field: &str) -> Result<Option<f64>, String> {
    value.map(|v| v.to_f64(field)).transpose()
}

/// Deserialize a present field (including explicit `null`) as `Some(..)`.
///
/// Paired with `#[serde(default)]` this yields the usual three states for
/// patch payloads: absent (`None`), `null` (`Some(None)`) and a value.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
