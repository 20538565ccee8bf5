//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding the listen host.
pub const ENV_HOST: &str = "APP_HOST";
/// Environment variable overriding the listen port.
pub const ENV_PORT: &str = "APP_PORT";
/// Environment variable overriding the origin address.
pub const ENV_ORIGIN: &str = "ORIGIN_SERVER";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("APP_PORT={value:?} is not a valid port: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file without validating it.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `APP_HOST`, `APP_PORT` and `ORIGIN_SERVER` on top of `config`.
///
/// `lookup` abstracts the environment so the overrides can be exercised
/// without touching process state.
pub fn apply_env_overrides<F>(mut config: ProxyConfig, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST).filter(|h| !h.trim().is_empty()) {
        config.listener.host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
        config.listener.port = port
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidPort { value: port.clone(), source })?;
    }
    if let Some(origin) = lookup(ENV_ORIGIN) {
        config.origin.address = origin;
    }
    Ok(config)
}

/// Load the full configuration: optional file, environment overrides, validation.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let base = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };
    let config = apply_env_overrides(base, |key| std::env::var(key).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
