//! WebSocket wire protocol
//!
//! Every frame is a JSON text envelope `{"type": "<kebab-case>", "data": ...}`.
//! Well-scoped client commands carry the well id either as a bare string
//! (`"data": "W1"`) or as `{"wellId": "W1"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ParameterStatus;

/// Well id argument of a client command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WellTarget {
    Id(String),
    #[serde(rename_all = "camelCase")]
    Object { well_id: String },
}

impl WellTarget {
    pub fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Object { well_id: id } => id,
        }
    }
}

/// Client → server commands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinWell(WellTarget),
    LeaveWell(WellTarget),
    RequestLatestData(WellTarget),
    DrillingParameterUpdate(DrillingParameterUpdate),
    WellUpdate(WellUpdate),
    StartSimulation(WellTarget),
    StopSimulation(WellTarget),
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    Message(SystemMessage),
    JoinedWell(JoinedWell),
    LatestData(LatestData),
    DrillingParameterUpdate(DrillingParameterUpdate),
    WellUpdate(WellUpdate),
}

impl ServerMessage {
    /// Well the event belongs to; `None` for system messages.
    pub fn well_id(&self) -> Option<&str> {
        match self {
            Self::Message(_) => None,
            Self::JoinedWell(m) => Some(&m.well_id),
            Self::LatestData(m) => Some(&m.well_id),
            Self::DrillingParameterUpdate(m) => Some(&m.well_id),
            Self::WellUpdate(m) => Some(&m.well_id),
        }
    }
}

/// A single live drilling parameter reading. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillingParameterUpdate {
    pub well_id: String,
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(default)]
    pub status: ParameterStatus,
    /// Overwritten by the relay on arrival.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Live well gauge values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellUpdate {
    pub well_id: String,
    pub depth: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    /// Overwritten by the relay on arrival.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedWell {
    pub well_id: String,
    pub message: String,
}

/// Snapshot of current readings for one well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestData {
    pub well_id: String,
    pub parameters: Vec<DrillingParameterUpdate>,
    pub well_data: WellSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellSnapshot {
    pub depth: f64,
    pub temperature: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub text: String,
    pub sender_id: String,
    pub timestamp: DateTime<Utc>,
}

impl SystemMessage {
    pub fn welcome() -> Self {
        Self {
            text: "Welcome to the WellWatch live-update relay".to_string(),
            sender_id: "system".to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_commands_accept_bare_and_object_ids() {
        let bare: ClientMessage =
            serde_json::from_value(json!({"type": "join-well", "data": "W1"})).unwrap();
        let object: ClientMessage =
            serde_json::from_value(json!({"type": "join-well", "data": {"wellId": "W1"}}))
                .unwrap();
        let (ClientMessage::JoinWell(bare), ClientMessage::JoinWell(object)) = (bare, object)
        else {
            panic!("expected join-well");
        };
        assert_eq!(bare.into_id(), "W1");
        assert_eq!(object.into_id(), "W1");
    }

    #[test]
    fn test_parameter_update_without_timestamp() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "drilling-parameter-update",
            "data": {"wellId": "W1", "name": "ROP", "value": 27.5, "unit": "m/h"}
        }))
        .unwrap();
        let ClientMessage::DrillingParameterUpdate(update) = msg else {
            panic!("expected drilling-parameter-update");
        };
        assert_eq!(update.status, ParameterStatus::Normal);
        assert_eq!(update.value, 27.5);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_value(json!({"type": "drop-tables", "data": "W1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_server_envelope_shape() {
        let msg = ServerMessage::JoinedWell(JoinedWell {
            well_id: "W1".to_string(),
            message: "Connected to well W1".to_string(),
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "joined-well");
        assert_eq!(value["data"]["wellId"], "W1");
        assert_eq!(msg.well_id(), Some("W1"));

        let update = ServerMessage::WellUpdate(WellUpdate {
            well_id: "W1".to_string(),
            depth: 3251.0,
            temperature: None,
            pressure: Some(4520.0),
            flow_rate: None,
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "well-update");
        assert!(value["data"].get("temperature").is_none());
    }
}
