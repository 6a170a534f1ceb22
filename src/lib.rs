//! WellWatch: Oil-Well Drilling Telemetry
//!
//! Well records, WITSML export and a live drilling-parameter relay.
//!
//! ## Architecture
//!
//! - **Storage**: Well aggregate and append-only child records (sled or in-memory)
//! - **API**: REST endpoints for wells, parameters, logs, operations and WITSML
//! - **Relay**: Per-well publish/subscribe over WebSocket with simulation timers
//! - **WITSML**: XML/JSON document generation for stored and sample data

pub mod api;
pub mod auth;
pub mod config;
pub mod relay;
pub mod storage;
pub mod types;
pub mod witsml;

// Re-export configuration
pub use config::AppConfig;

// Re-export commonly used types
pub use types::{
    DrillingParameter, NewWell, Operation, OperationStatus, ParameterStatus, Well, WellLog,
    WellStatus, WitsmlDataEntry,
};

// Re-export storage
pub use storage::{InMemoryStore, SledStore, StoreError, WellStore};

// Re-export relay
pub use relay::{LiveFeed, RelayHub};
