//! System-wide default constants.
//!
//! Grouped by subsystem. Values here seed the `Default` impls in
//! [`super::AppConfig`] and the query defaults in `storage::query`.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address when neither config nor CLI sets one.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Request body cap for the REST API (bytes).
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Per-request timeout for REST handlers (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Storage
// ============================================================================

/// Default sled directory.
pub const STORAGE_PATH: &str = "./data/wellwatch";

// ============================================================================
// Query page sizes
// ============================================================================

/// `GET /wells` page size.
pub const WELL_PAGE_SIZE: usize = 10;

/// Hard cap on any `limit` query parameter.
pub const MAX_PAGE_SIZE: usize = 500;

pub const PARAMETER_PAGE_SIZE: usize = 50;
pub const LOG_PAGE_SIZE: usize = 100;
pub const OPERATION_PAGE_SIZE: usize = 20;
pub const WITSML_PAGE_SIZE: usize = 10;

// ============================================================================
// Well detail
// ============================================================================

/// Related rows embedded in `GET /wells/:id`.
pub const DETAIL_PARAMETER_LIMIT: usize = 10;
pub const DETAIL_WITSML_LIMIT: usize = 5;
pub const DETAIL_LOG_LIMIT: usize = 20;
pub const DETAIL_OPERATION_LIMIT: usize = 10;

// ============================================================================
// Live-update relay
// ============================================================================

/// Interval between synthetic parameter updates (ms).
pub const SIMULATION_INTERVAL_MS: u64 = 2_000;

/// Outbound queue depth per WebSocket connection (messages).
///
/// When full, further messages to that client are dropped.
pub const OUTBOUND_BUFFER: usize = 256;

/// Client-side ring buffer capacity for parameter updates.
pub const PARAMETER_HISTORY: usize = 100;

/// Client-side ring buffer capacity for well updates.
pub const WELL_HISTORY: usize = 50;

// ============================================================================
// Auth
// ============================================================================

pub const AUTH_USERNAME: &str = "admin";
pub const AUTH_PASSWORD: &str = "admin";
