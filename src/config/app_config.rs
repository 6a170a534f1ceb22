//! Service configuration: server, storage, relay, API and login settings.
//!
//! Every section implements `Default` from [`super::defaults`], so an empty
//! or partial TOML file is valid and missing keys fall back to built-ins.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;

/// Env var naming the config file.
pub const CONFIG_ENV: &str = "WELLWATCH_CONFIG";

/// Env var overriding `server.addr`.
pub const SERVER_ADDR_ENV: &str = "WELLWATCH_SERVER_ADDR";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "wellwatch.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a WellWatch deployment.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$WELLWATCH_CONFIG` env var
/// 2. `./wellwatch.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Live-update relay tuning
    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub api: ApiConfig,

    /// Credentials accepted by `POST /api/auth/login`
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WELLWATCH_CONFIG` environment variable
    /// 2. `./wellwatch.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that exists but fails to parse or validate is logged and
    /// skipped.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV);
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {}, falling back",
                            CONFIG_ENV
                        );
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV);
            }
        }

        // 2. Check ./wellwatch.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        for warning in super::validation::validate_unknown_keys(&contents) {
            warn!(path = %path.display(), key = %warning.field, "{}", warning);
        }
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `$WELLWATCH_SERVER_ADDR` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(SERVER_ADDR_ENV) {
            if !addr.trim().is_empty() {
                self.server.addr = addr;
            }
        }
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check internal consistency.
    ///
    /// - Bind address and storage path must be non-empty
    /// - Simulation interval, outbound buffer and history sizes must be > 0
    /// - Default page size must be in `1..=max_page_size`
    /// - Login credentials must be non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }
        if self.storage.backend == StorageBackend::Sled && self.storage.path.trim().is_empty() {
            errors.push("storage.path must not be empty for the sled backend".to_string());
        }

        if self.relay.simulation_interval_ms == 0 {
            errors.push("relay.simulation_interval_ms must be > 0".to_string());
        }
        let counts = [
            (self.relay.outbound_buffer, "relay.outbound_buffer"),
            (self.relay.parameter_history, "relay.parameter_history"),
            (self.relay.well_history, "relay.well_history"),
            (self.api.max_page_size, "api.max_page_size"),
        ];
        for (value, name) in counts {
            Self::check_positive(value, name, &mut errors);
        }

        if self.api.default_page_size == 0 || self.api.default_page_size > self.api.max_page_size {
            errors.push(format!(
                "api.default_page_size ({}) must be between 1 and api.max_page_size ({})",
                self.api.default_page_size, self.api.max_page_size
            ));
        }

        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            errors.push("auth.username and auth.password must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: usize, name: &str, errors: &mut Vec<String>) {
        if value == 0 {
            errors.push(format!("{name} must be > 0"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `WELLWATCH_SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Allowed CORS origins. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            cors_origins: Vec::new(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// sled directory; ignored by the memory backend.
    #[serde(default = "default_storage_path")]
    pub path: String,

    /// Insert the three demo wells when the store is empty at startup.
    #[serde(default)]
    pub seed_demo_data: bool,
}

fn default_storage_path() -> String {
    defaults::STORAGE_PATH.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            seed_demo_data: false,
        }
    }
}

// ============================================================================
// Relay
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Interval between synthetic updates while a simulation runs (ms).
    pub simulation_interval_ms: u64,
    /// Per-connection outbound queue depth.
    pub outbound_buffer: usize,
    /// Live feed capacity for parameter updates.
    pub parameter_history: usize,
    /// Live feed capacity for well updates.
    pub well_history: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            simulation_interval_ms: defaults::SIMULATION_INTERVAL_MS,
            outbound_buffer: defaults::OUTBOUND_BUFFER,
            parameter_history: defaults::PARAMETER_HISTORY,
            well_history: defaults::WELL_HISTORY,
        }
    }
}

impl RelayConfig {
    pub fn simulation_interval(&self) -> Duration {
        Duration::from_millis(self.simulation_interval_ms)
    }
}

// ============================================================================
// API
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// `GET /wells` page size when `limit` is absent.
    pub default_page_size: usize,
    /// Upper bound applied to every `limit` query parameter.
    pub max_page_size: usize,
    /// Reject well creation that breaks the form rules (depth >= 0,
    /// depth <= targetDepth).
    pub enforce_form_rules: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_page_size: defaults::WELL_PAGE_SIZE,
            max_page_size: defaults::MAX_PAGE_SIZE,
            enforce_form_rules: false,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: defaults::AUTH_USERNAME.to_string(),
            password: defaults::AUTH_PASSWORD.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.relay.simulation_interval(), Duration::from_secs(2));
        assert_eq!(config.api.default_page_size, 10);
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[server]
addr = "127.0.0.1:9000"

[storage]
backend = "memory"
seed_demo_data = true

[relay]
simulation_interval_ms = 500
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.storage.seed_demo_data);
        assert_eq!(config.relay.simulation_interval_ms, 500);
        // Non-overridden values retain defaults
        assert_eq!(config.relay.outbound_buffer, defaults::OUTBOUND_BUFFER);
        assert_eq!(config.storage.path, defaults::STORAGE_PATH);
        assert_eq!(config.auth.username, "admin");
    }

    #[test]
    fn test_validation_catches_bad_page_size() {
        let mut config = AppConfig::default();
        config.api.default_page_size = 1000;
        config.relay.outbound_buffer = 0;
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("default_page_size")));
            assert!(errors.iter().any(|e| e.contains("outbound_buffer")));
        }
    }

    #[test]
    fn test_validate_checks_interval_without_truncation() {
        let mut config = AppConfig::default();
        config.relay.simulation_interval_ms = 1 << 32;
        assert!(config.validate().is_ok());

        config.relay.simulation_interval_ms = 0;
        config.relay.well_history = 0;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation errors");
        };
        assert!(errors.contains(&"relay.simulation_interval_ms must be > 0".to_string()));
        assert!(errors.contains(&"relay.well_history must be > 0".to_string()));
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wellwatch.toml");
        std::fs::write(&path, "[relay]\nsimulation_interval_ms = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::Validation(_))
        ));

        std::fs::write(&path, "[server\n").unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::Parse(_, _))
        ));
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = AppConfig::default();
        config.server.cors_origins = vec!["http://localhost:3000".to_string()];
        let toml_str = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_auth_debug_redacts_password() {
        let rendered = format!("{:?}", AuthConfig::default());
        assert!(!rendered.contains("\"admin\", password: \"admin\""));
        assert!(rendered.contains("<redacted>"));
    }
}
