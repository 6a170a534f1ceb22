//! API route handlers
//!
//! Request handling for all API endpoints:
//! - Wells: list, create, fetch, update, delete
//! - Child records: parameters, logs, operations, WITSML entries
//! - WITSML sample documents
//! - Health and login

mod auth;
mod health;
mod records;
mod wells;
mod witsml;

pub use auth::*;
pub use health::*;
pub use records::*;
pub use wells::*;
pub use witsml::*;

use std::sync::Arc;
use std::time::Instant;

use crate::auth::{CredentialVerifier, StaticCredentials};
use crate::config::AppConfig;
use crate::relay::RelayHub;
use crate::storage::WellStore;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Well persistence backend
    pub store: Arc<dyn WellStore>,
    /// Live-update relay
    pub relay: RelayHub,
    pub config: Arc<AppConfig>,
    /// Login check for `POST /api/auth/login`
    pub verifier: Arc<dyn CredentialVerifier>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state with the relay and credential check derived from `config`.
    pub fn new(store: Arc<dyn WellStore>, config: AppConfig) -> Self {
        let relay = RelayHub::new(&config.relay);
        let verifier = Arc::new(StaticCredentials::from_config(&config.auth));
        Self {
            store,
            relay,
            config: Arc::new(config),
            verifier,
            started_at: Instant::now(),
        }
    }

    /// Swap the credential check.
    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
