//! Live-update relay
//!
//! Publish/subscribe over WebSocket, keyed by well id:
//! - [`RelayHub`]: channel membership, fan-out and per-channel simulation timers
//! - [`protocol`]: `{type, data}` JSON envelopes in both directions
//! - [`simulation`]: synthetic drilling parameter readings
//! - [`LiveFeed`]: consumer-side fold of relay events with bounded history
//!
//! Nothing the relay carries is persisted.

mod feed;
mod hub;
pub mod protocol;
pub mod simulation;

pub use feed::LiveFeed;
pub use hub::{ConnectionId, RelayHub, RelayStats};
pub use protocol::{ClientMessage, ServerMessage};
