//! Tolk Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, and loads the configuration.

pub mod adapters;
pub mod settings;

pub use adapters::{DEFAULT_REQUEST_TIMEOUT, LoggingNavigator, ReqwestHttpClient};
pub use settings::{SettingsError, load_settings, load_settings_from};
