//! Service Configuration Module
//!
//! Provides the service configuration loaded from a TOML file.
//!
//! ## Loading Order
//!
//! 1. `WELLWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `wellwatch.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Unknown keys in a loaded file are logged as warnings with the closest
//! valid key (see [`validation`]).
//!
//! The loaded [`AppConfig`] is passed by value into the application state;
//! there is no global config handle.

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;
