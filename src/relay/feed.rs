//! Client-side live feed state
//!
//! Folds relay events into the latest snapshot plus bounded histories of
//! recent updates. Owned by whoever consumes a relay connection; nothing
//! here is shared or global.

use std::collections::VecDeque;

use super::protocol::{DrillingParameterUpdate, LatestData, ServerMessage, WellUpdate};
use crate::config::{defaults, RelayConfig};

#[derive(Debug, Clone)]
pub struct LiveFeed {
    joined_well: Option<String>,
    latest: Option<LatestData>,
    parameter_updates: VecDeque<DrillingParameterUpdate>,
    well_updates: VecDeque<WellUpdate>,
    parameter_capacity: usize,
    well_capacity: usize,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new(defaults::PARAMETER_HISTORY, defaults::WELL_HISTORY)
    }
}

impl LiveFeed {
    /// Capacities are clamped to at least 1.
    pub fn new(parameter_capacity: usize, well_capacity: usize) -> Self {
        let parameter_capacity = parameter_capacity.max(1);
        let well_capacity = well_capacity.max(1);
        Self {
            joined_well: None,
            latest: None,
            parameter_updates: VecDeque::with_capacity(parameter_capacity),
            well_updates: VecDeque::with_capacity(well_capacity),
            parameter_capacity,
            well_capacity,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.parameter_history, config.well_history)
    }

    /// Fold one relay event into the feed.
    pub fn apply(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Message(_) => {}
            ServerMessage::JoinedWell(joined) => self.joined_well = Some(joined.well_id),
            ServerMessage::LatestData(latest) => self.latest = Some(latest),
            ServerMessage::DrillingParameterUpdate(update) => {
                push_bounded(&mut self.parameter_updates, update, self.parameter_capacity);
            }
            ServerMessage::WellUpdate(update) => {
                push_bounded(&mut self.well_updates, update, self.well_capacity);
            }
        }
    }

    pub fn joined_well(&self) -> Option<&str> {
        self.joined_well.as_deref()
    }

    pub fn latest(&self) -> Option<&LatestData> {
        self.latest.as_ref()
    }

    /// Oldest first.
    pub fn parameter_updates(&self) -> impl Iterator<Item = &DrillingParameterUpdate> {
        self.parameter_updates.iter()
    }

    /// Oldest first.
    pub fn well_updates(&self) -> impl Iterator<Item = &WellUpdate> {
        self.well_updates.iter()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_updates.len()
    }

    pub fn well_update_count(&self) -> usize {
        self.well_updates.len()
    }

    /// Most recent update for a named parameter.
    pub fn latest_parameter(&self, name: &str) -> Option<&DrillingParameterUpdate> {
        self.parameter_updates.iter().rev().find(|u| u.name == name)
    }

    /// Drop all state, e.g. when switching wells.
    pub fn clear(&mut self) {
        self.joined_well = None;
        self.latest = None;
        self.parameter_updates.clear();
        self.well_updates.clear();
    }
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, item: T, capacity: usize) {
    while buffer.len() >= capacity {
        buffer.pop_front();
    }
    buffer.push_back(item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::protocol::{JoinedWell, SystemMessage};
    use crate::relay::simulation::latest_snapshot;
    use crate::types::ParameterStatus;
    use chrono::Utc;

    fn parameter(value: f64) -> ServerMessage {
        ServerMessage::DrillingParameterUpdate(DrillingParameterUpdate {
            well_id: "W1".to_string(),
            name: "ROP".to_string(),
            value,
            unit: "m/h".to_string(),
            status: ParameterStatus::Normal,
            timestamp: Utc::now(),
        })
    }

    fn well(depth: f64) -> ServerMessage {
        ServerMessage::WellUpdate(WellUpdate {
            well_id: "W1".to_string(),
            depth,
            temperature: None,
            pressure: None,
            flow_rate: None,
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn test_parameter_history_keeps_newest_100() {
        let mut feed = LiveFeed::default();
        for i in 0..150 {
            feed.apply(parameter(i as f64));
        }
        assert_eq!(feed.parameter_count(), 100);
        assert_eq!(feed.parameter_updates().next().unwrap().value, 50.0);
        assert_eq!(feed.latest_parameter("ROP").unwrap().value, 149.0);
    }

    #[test]
    fn test_well_history_keeps_newest_50() {
        let mut feed = LiveFeed::default();
        for i in 0..51 {
            feed.apply(well(i as f64));
        }
        assert_eq!(feed.well_update_count(), 50);
        assert_eq!(feed.well_updates().next().unwrap().depth, 1.0);
        assert_eq!(feed.well_updates().last().unwrap().depth, 50.0);
    }

    #[test]
    fn test_apply_tracks_join_and_snapshot() {
        let mut feed = LiveFeed::new(3, 3);
        feed.apply(ServerMessage::Message(SystemMessage::welcome()));
        assert!(feed.joined_well().is_none());

        feed.apply(ServerMessage::JoinedWell(JoinedWell {
            well_id: "W1".to_string(),
            message: "Connected to well W1".to_string(),
        }));
        feed.apply(ServerMessage::LatestData(latest_snapshot("W1")));
        assert_eq!(feed.joined_well(), Some("W1"));
        assert_eq!(feed.latest().unwrap().well_id, "W1");

        feed.clear();
        assert!(feed.latest().is_none());
        assert_eq!(feed.parameter_count(), 0);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut feed = LiveFeed::new(0, 0);
        feed.apply(parameter(1.0));
        feed.apply(parameter(2.0));
        assert_eq!(feed.parameter_count(), 1);
        assert_eq!(feed.latest_parameter("ROP").unwrap().value, 2.0);
    }
}
