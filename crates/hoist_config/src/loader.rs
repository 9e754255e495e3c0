//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::HoistConfig;
use std::path::Path;

/// Name of the configuration file inside an install directory.
pub const CONFIG_FILE: &str = "hoist.toml";

/// Loads and validates `hoist.toml` from an install directory.
///
/// A missing file yields the default configuration.
pub fn load_config(install_dir: &Path) -> Result<HoistConfig, ConfigError> {
    let config_path = install_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(HoistConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates a configuration file that must exist.
pub fn load_config_file(path: &Path) -> Result<HoistConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `hoist.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<HoistConfig, ConfigError> {
    let config: HoistConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are usable.
fn validate_config(config: &HoistConfig) -> Result<(), ConfigError> {
    let wait = &config.wait;
    for (key, value) in [
        ("wait.api_timeout", wait.api_timeout),
        ("wait.event_timeout", wait.event_timeout),
        ("wait.poll_interval", wait.poll_interval),
        ("wait.retry_delay", wait.retry_delay),
    ] {
        if value.is_zero() {
            return Err(ConfigError::Invalid {
                key,
                problem: "must be non-zero",
            });
        }
    }
    if wait.log_downsample == 0 {
        return Err(ConfigError::Invalid {
            key: "wait.log_downsample",
            problem: "must be at least 1",
        });
    }
    for (key, value) in [
        ("wait.namespace", &wait.namespace),
        ("wait.completion_event", &wait.completion_event),
        ("log.level", &config.log.level),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key,
                problem: "must not be empty",
            });
        }
    }
    Ok(())
}
