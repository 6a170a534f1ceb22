//! Channel registry and simulation timers
//!
//! All relay state lives behind one mutex. Every operation is a short
//! critical section that never awaits, so broadcasts to a channel are
//! delivered to each member in the order the hub processed them.
//!
//! Outbound delivery uses `try_send`: a client whose queue is full loses
//! the message rather than stalling the hub.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::{
    ClientMessage, DrillingParameterUpdate, JoinedWell, ServerMessage, SystemMessage, WellUpdate,
};
use super::simulation::{latest_snapshot, Simulator};
use crate::config::RelayConfig;

pub type ConnectionId = u64;

struct Connection {
    tx: mpsc::Sender<ServerMessage>,
    wells: HashSet<String>,
}

/// A running simulation timer, owned by its channel entry.
struct Simulation {
    id: u64,
    owner: ConnectionId,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl Simulation {
    fn stop(self) {
        self.cancel.cancel();
    }
}

#[derive(Default)]
struct Channel {
    members: BTreeSet<ConnectionId>,
    simulation: Option<Simulation>,
}

#[derive(Default)]
struct HubState {
    next_connection: ConnectionId,
    next_simulation: u64,
    connections: HashMap<ConnectionId, Connection>,
    channels: HashMap<String, Channel>,
}

impl HubState {
    fn send(&self, conn: ConnectionId, message: ServerMessage) {
        if let Some(connection) = self.connections.get(&conn) {
            deliver(conn, connection, message);
        }
    }

    fn broadcast(&self, well_id: &str, message: ServerMessage) -> usize {
        let Some(channel) = self.channels.get(well_id) else {
            return 0;
        };
        let mut delivered = 0;
        for conn in &channel.members {
            if let Some(connection) = self.connections.get(conn) {
                if deliver(*conn, connection, message.clone()) {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Remove `conn` from a channel. Stops the channel's simulation if `conn`
    /// owned it and drops the channel once empty.
    fn leave(&mut self, conn: ConnectionId, well_id: &str) {
        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.wells.remove(well_id);
        }

        let Some(channel) = self.channels.get_mut(well_id) else {
            return;
        };
        channel.members.remove(&conn);

        if channel.simulation.as_ref().is_some_and(|s| s.owner == conn) {
            if let Some(sim) = channel.simulation.take() {
                debug!(well_id = %well_id, conn, "Owner left channel, stopping simulation");
                sim.stop();
            }
        }

        if channel.members.is_empty() {
            if let Some(channel) = self.channels.remove(well_id) {
                if let Some(sim) = channel.simulation {
                    sim.stop();
                }
            }
            debug!(well_id = %well_id, "Channel closed");
        }
    }
}

/// Returns whether the message was queued.
fn deliver(conn: ConnectionId, connection: &Connection, message: ServerMessage) -> bool {
    match connection.tx.try_send(message) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                conn,
                well_id = dropped.well_id().unwrap_or("-"),
                "Outbound queue full, dropping message"
            );
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(conn, "Outbound queue closed");
            false
        }
    }
}

/// Snapshot of relay occupancy, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub connections: usize,
    pub channels: usize,
    pub simulations: usize,
}

/// Publish/subscribe hub keyed by well id.
///
/// Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct RelayHub {
    state: Arc<Mutex<HubState>>,
    interval: Duration,
    outbound_buffer: usize,
    shutdown: CancellationToken,
}

impl RelayHub {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState::default())),
            interval: config.simulation_interval(),
            outbound_buffer: config.outbound_buffer.max(1),
            shutdown: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // Critical sections never leave the maps half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a connection and queue the welcome message.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        let mut state = self.lock();
        state.next_connection += 1;
        let conn = state.next_connection;
        state.connections.insert(
            conn,
            Connection {
                tx,
                wells: HashSet::new(),
            },
        );
        state.send(conn, ServerMessage::Message(SystemMessage::welcome()));
        debug!(conn, connections = state.connections.len(), "Relay client connected");
        (conn, rx)
    }

    /// Dispatch one client command.
    pub fn handle(&self, conn: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::JoinWell(target) => self.join(conn, &target.into_id()),
            ClientMessage::LeaveWell(target) => self.leave(conn, &target.into_id()),
            ClientMessage::RequestLatestData(target) => {
                self.request_latest(conn, &target.into_id())
            }
            ClientMessage::DrillingParameterUpdate(update) => {
                self.publish_parameter(update);
            }
            ClientMessage::WellUpdate(update) => {
                self.publish_well(update);
            }
            ClientMessage::StartSimulation(target) => {
                self.start_simulation(conn, &target.into_id());
            }
            ClientMessage::StopSimulation(target) => {
                self.stop_simulation(conn, &target.into_id());
            }
        }
    }

    /// Subscribe to a well channel. Sends `joined-well` followed by a
    /// `latest-data` snapshot.
    pub fn join(&self, conn: ConnectionId, well_id: &str) {
        let mut state = self.lock();
        let Some(connection) = state.connections.get_mut(&conn) else {
            return;
        };
        connection.wells.insert(well_id.to_string());
        state
            .channels
            .entry(well_id.to_string())
            .or_default()
            .members
            .insert(conn);

        state.send(
            conn,
            ServerMessage::JoinedWell(JoinedWell {
                well_id: well_id.to_string(),
                message: format!("Connected to well {well_id}"),
            }),
        );
        state.send(conn, ServerMessage::LatestData(latest_snapshot(well_id)));
        info!(conn, well_id = %well_id, "Client joined well channel");
    }

    pub fn leave(&self, conn: ConnectionId, well_id: &str) {
        self.lock().leave(conn, well_id);
        info!(conn, well_id = %well_id, "Client left well channel");
    }

    /// Send a fresh snapshot to the requester only.
    pub fn request_latest(&self, conn: ConnectionId, well_id: &str) {
        self.lock()
            .send(conn, ServerMessage::LatestData(latest_snapshot(well_id)));
    }

    /// Relay a parameter reading to the well's channel, stamped with the
    /// arrival time. Returns the number of subscribers reached.
    pub fn publish_parameter(&self, mut update: DrillingParameterUpdate) -> usize {
        update.timestamp = Utc::now();
        let well_id = update.well_id.clone();
        let delivered = self
            .lock()
            .broadcast(&well_id, ServerMessage::DrillingParameterUpdate(update));
        debug!(well_id = %well_id, delivered, "Relayed drilling parameter update");
        delivered
    }

    /// Relay a well gauge update, stamped with the arrival time.
    pub fn publish_well(&self, mut update: WellUpdate) -> usize {
        update.timestamp = Utc::now();
        let well_id = update.well_id.clone();
        let delivered = self
            .lock()
            .broadcast(&well_id, ServerMessage::WellUpdate(update));
        debug!(well_id = %well_id, delivered, "Relayed well update");
        delivered
    }

    /// Start the channel's simulation timer, owned by `conn`.
    ///
    /// Requires `conn` to be a channel member. A no-op if a timer is already
    /// running. Returns whether a timer was started.
    pub fn start_simulation(&self, conn: ConnectionId, well_id: &str) -> bool {
        let mut state = self.lock();
        state.next_simulation += 1;
        let sim_id = state.next_simulation;

        let Some(channel) = state.channels.get_mut(well_id) else {
            debug!(conn, well_id = %well_id, "Ignoring start-simulation from non-member");
            return false;
        };
        if !channel.members.contains(&conn) {
            debug!(conn, well_id = %well_id, "Ignoring start-simulation from non-member");
            return false;
        }
        if channel.simulation.is_some() {
            debug!(well_id = %well_id, "Simulation already running");
            return false;
        }

        let cancel = self.shutdown.child_token();
        let task = tokio::spawn(self.clone().run_simulation(
            well_id.to_string(),
            sim_id,
            cancel.clone(),
        ));
        channel.simulation = Some(Simulation {
            id: sim_id,
            owner: conn,
            cancel,
            _task: task,
        });
        let interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX);
        info!(conn, well_id = %well_id, interval_ms, "Simulation started");
        true
    }

    /// Cancel the channel's simulation timer.
    ///
    /// Any channel member may stop it; requests from non-members are
    /// ignored. Returns whether a timer was stopped.
    pub fn stop_simulation(&self, conn: ConnectionId, well_id: &str) -> bool {
        let sim = {
            let mut state = self.lock();
            let Some(channel) = state.channels.get_mut(well_id) else {
                return false;
            };
            if !channel.members.contains(&conn) {
                debug!(conn, well_id = %well_id, "Ignoring stop-simulation from non-member");
                return false;
            }
            channel.simulation.take()
        };
        match sim {
            Some(sim) => {
                sim.stop();
                info!(conn, well_id = %well_id, "Simulation stopped");
                true
            }
            None => false,
        }
    }

    /// Drop a connection: leave every channel and stop timers it owns.
    pub fn disconnect(&self, conn: ConnectionId) {
        let mut state = self.lock();
        let wells: Vec<String> = state
            .connections
            .get(&conn)
            .map(|c| c.wells.iter().cloned().collect())
            .unwrap_or_default();
        for well_id in &wells {
            state.leave(conn, well_id);
        }
        state.connections.remove(&conn);
        debug!(conn, channels_left = wells.len(), "Relay client disconnected");
    }

    pub fn stats(&self) -> RelayStats {
        let state = self.lock();
        RelayStats {
            connections: state.connections.len(),
            channels: state.channels.len(),
            simulations: state
                .channels
                .values()
                .filter(|c| c.simulation.is_some())
                .count(),
        }
    }

    pub fn is_member(&self, conn: ConnectionId, well_id: &str) -> bool {
        self.lock()
            .channels
            .get(well_id)
            .is_some_and(|c| c.members.contains(&conn))
    }

    /// Cancel every simulation timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let mut state = self.lock();
        for channel in state.channels.values_mut() {
            channel.simulation = None;
        }
        info!("Relay shut down");
    }

    async fn run_simulation(self, well_id: String, sim_id: u64, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut simulator = Simulator::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.simulation_tick(&well_id, sim_id, &mut simulator) {
                        break;
                    }
                }
            }
        }
        debug!(well_id = %well_id, sim_id, "Simulation task exited");
    }

    /// Emit one synthetic reading if simulation `sim_id` is still current
    /// and its owner is still subscribed. Returns whether to keep running.
    fn simulation_tick(&self, well_id: &str, sim_id: u64, simulator: &mut Simulator) -> bool {
        let mut state = self.lock();
        let Some(channel) = state.channels.get_mut(well_id) else {
            return false;
        };
        let owner = match &channel.simulation {
            Some(sim) if sim.id == sim_id => sim.owner,
            _ => return false,
        };
        if !channel.members.contains(&owner) {
            if let Some(sim) = channel.simulation.take() {
                sim.stop();
            }
            return false;
        }

        let update = simulator.next_update(well_id);
        state.broadcast(well_id, ServerMessage::DrillingParameterUpdate(update));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::protocol::WellTarget;
    use crate::types::ParameterStatus;

    fn hub() -> RelayHub {
        RelayHub::new(&RelayConfig::default())
    }

    /// Drain everything currently queued.
    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn reading(well_id: &str, value: f64) -> DrillingParameterUpdate {
        DrillingParameterUpdate {
            well_id: well_id.to_string(),
            name: "ROP".to_string(),
            value,
            unit: "m/h".to_string(),
            status: ParameterStatus::Normal,
            timestamp: chrono::DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn test_connect_sends_welcome() {
        let hub = hub();
        let (_conn, mut rx) = hub.connect();
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], ServerMessage::Message(_)));
    }

    #[tokio::test]
    async fn test_join_sends_ack_then_snapshot() {
        let hub = hub();
        let (conn, mut rx) = hub.connect();
        drain(&mut rx);

        hub.handle(conn, ClientMessage::JoinWell(WellTarget::Id("W1".to_string())));
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 2);
        match &messages[0] {
            ServerMessage::JoinedWell(j) => assert_eq!(j.message, "Connected to well W1"),
            other => panic!("expected joined-well, got {other:?}"),
        }
        assert!(matches!(&messages[1], ServerMessage::LatestData(d) if d.well_id == "W1"));
        assert!(hub.is_member(conn, "W1"));
    }

    #[tokio::test]
    async fn test_publish_restamps_and_scopes_to_channel() {
        let hub = hub();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        hub.join(a, "W1");
        hub.join(b, "W2");
        drain(&mut rx_a);
        drain(&mut rx_b);

        assert_eq!(hub.publish_parameter(reading("W1", 30.0)), 1);
        let messages = drain(&mut rx_a);
        match &messages[..] {
            [ServerMessage::DrillingParameterUpdate(u)] => {
                assert_eq!(u.value, 30.0);
                assert!(u.timestamp > chrono::DateTime::<Utc>::UNIX_EPOCH);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn test_request_latest_goes_to_requester_only() {
        let hub = hub();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        hub.join(a, "W1");
        hub.join(b, "W1");
        drain(&mut rx_a);
        drain(&mut rx_b);

        hub.request_latest(a, "W1");
        assert_eq!(drain(&mut rx_a).len(), 1);
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn test_last_leave_destroys_channel() {
        let hub = hub();
        let (a, _rx_a) = hub.connect();
        let (b, _rx_b) = hub.connect();
        hub.join(a, "W1");
        hub.join(b, "W1");
        hub.leave(a, "W1");
        assert_eq!(hub.stats().channels, 1);
        hub.leave(b, "W1");
        assert_eq!(hub.stats().channels, 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_messages() {
        let config = RelayConfig {
            outbound_buffer: 2,
            ..RelayConfig::default()
        };
        let hub = RelayHub::new(&config);
        let (conn, mut rx) = hub.connect();
        // welcome + joined-well fill the queue; the snapshot is dropped
        hub.join(conn, "W1");
        assert_eq!(hub.publish_parameter(reading("W1", 1.0)), 0);

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1], ServerMessage::JoinedWell(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_delivers_within_three_seconds() {
        let hub = hub();
        let (conn, mut rx) = hub.connect();
        hub.join(conn, "W1");
        drain(&mut rx);

        assert!(hub.start_simulation(conn, "W1"));
        let msg = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("update within 3s")
            .unwrap();
        assert!(matches!(msg, ServerMessage::DrillingParameterUpdate(u) if u.well_id == "W1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_interval() {
        let hub = hub();
        let (conn, mut rx) = hub.connect();
        hub.join(conn, "W1");
        drain(&mut rx);

        hub.start_simulation(conn, "W1");
        let early = tokio::time::timeout(Duration::from_millis(1900), rx.recv()).await;
        assert!(early.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_simulation_silences_channel() {
        let hub = hub();
        let (conn, mut rx) = hub.connect();
        hub.join(conn, "W1");
        drain(&mut rx);

        hub.start_simulation(conn, "W1");
        tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .unwrap()
            .unwrap();

        hub.handle(conn, ClientMessage::StopSimulation(WellTarget::Id("W1".to_string())));
        let after = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(after.is_err(), "no updates after stop");
        assert_eq!(hub.stats().simulations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_membership_and_is_idempotent() {
        let hub = hub();
        let (a, _rx_a) = hub.connect();
        let (b, _rx_b) = hub.connect();
        assert!(!hub.start_simulation(a, "W1"));

        hub.join(a, "W1");
        hub.join(b, "W1");
        assert!(hub.start_simulation(a, "W1"));
        assert!(!hub.start_simulation(b, "W1"));
        assert_eq!(hub.stats().simulations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_clients_see_identical_order() {
        let hub = hub();
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        hub.join(a, "W1");
        hub.join(b, "W1");
        drain(&mut rx_a);
        drain(&mut rx_b);

        hub.start_simulation(a, "W1");
        for i in 0..3 {
            hub.publish_parameter(reading("W1", 100.0 + i as f64));
            tokio::time::sleep(Duration::from_millis(1500)).await;
        }

        let seen_a = drain(&mut rx_a);
        let seen_b = drain(&mut rx_b);
        assert!(seen_a.len() >= 5);
        assert_eq!(seen_a, seen_b);
    }

    #[tokio::test(start_paused = true)]
    async fn test_owner_leaving_stops_simulation() {
        let hub = hub();
        let (owner, _rx_owner) = hub.connect();
        let (viewer, mut rx_viewer) = hub.connect();
        hub.join(owner, "W1");
        hub.join(viewer, "W1");
        hub.start_simulation(owner, "W1");
        drain(&mut rx_viewer);

        hub.leave(owner, "W1");
        assert_eq!(hub.stats().simulations, 0);
        let after = tokio::time::timeout(Duration::from_secs(5), rx_viewer.recv()).await;
        assert!(after.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_owned_timer() {
        let hub = hub();
        let (conn, _rx) = hub.connect();
        hub.join(conn, "W1");
        hub.join(conn, "W2");
        hub.start_simulation(conn, "W1");
        assert_eq!(hub.stats().simulations, 1);

        hub.disconnect(conn);
        assert_eq!(
            hub.stats(),
            RelayStats {
                connections: 0,
                channels: 0,
                simulations: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_member_may_stop() {
        let hub = hub();
        let (owner, _rx_owner) = hub.connect();
        let (other, _rx_other) = hub.connect();
        hub.join(owner, "W1");
        hub.join(other, "W1");
        hub.start_simulation(owner, "W1");

        hub.handle(other, ClientMessage::StopSimulation(WellTarget::Id("W1".to_string())));
        assert_eq!(hub.stats().simulations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_member_cannot_stop() {
        let hub = hub();
        let (owner, mut rx_owner) = hub.connect();
        let (outsider, _rx_outsider) = hub.connect();
        hub.join(owner, "W1");
        hub.join(outsider, "W2");
        hub.start_simulation(owner, "W1");
        drain(&mut rx_owner);

        hub.handle(
            outsider,
            ClientMessage::StopSimulation(WellTarget::Id("W1".to_string())),
        );
        assert!(!hub.stop_simulation(outsider, "W1"));
        assert_eq!(hub.stats().simulations, 1);

        let msg = tokio::time::timeout(Duration::from_secs(3), rx_owner.recv())
            .await
            .expect("simulation still running")
            .unwrap();
        assert!(matches!(msg, ServerMessage::DrillingParameterUpdate(_)));
    }
}
