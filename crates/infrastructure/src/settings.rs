//! Session configuration loading.
//!
//! Sources, later ones override earlier ones:
//! 1. Built-in defaults
//! 2. `tolk.toml` in the working directory, or the file passed explicitly
//! 3. `TOLK_*` environment variables; nested keys use `__`, e.g.
//!    `TOLK_PATHS__AUTH=/login`

use std::path::Path;

use config::{Config, Environment, File, Map};
use thiserror::Error;
use tolk_application::SessionConfig;
use tolk_domain::DomainError;

/// Default settings file name, without extension.
pub const DEFAULT_SETTINGS_FILE: &str = "tolk";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TOLK";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or did not match the expected shape.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged settings are not usable.
    #[error("invalid settings: {0}")]
    Invalid(#[from] DomainError),
}

/// Loads settings from the process environment and `file`, or from an
/// optional `tolk.toml` in the working directory when `file` is `None`.
///
/// # Errors
///
/// Returns an error if a source cannot be parsed or the result is invalid.
pub fn load_settings(file: Option<&Path>) -> Result<SessionConfig, SettingsError> {
    load_settings_from(file, None)
}

/// Like [`load_settings`], but reads environment variables from `env`
/// instead of the process environment when given.
///
/// # Errors
///
/// Returns an error if a source cannot be parsed or the result is invalid.
pub fn load_settings_from(
    file: Option<&Path>,
    env: Option<Map<String, String>>,
) -> Result<SessionConfig, SettingsError> {
    let file_source = match file {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
    };

    let settings: SessionConfig = Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    tracing::debug!(
        api_base_url = %settings.api_base_url,
        renew_timeout_ms = settings.renew_timeout_ms,
        "settings loaded"
    );
    Ok(settings)
}
