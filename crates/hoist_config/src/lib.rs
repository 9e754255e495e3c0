//! Parsing and validation of `hoist.toml` installer configuration files.
//!
//! Every setting has a default, so the file is optional. The result is a
//! [`HoistConfig`] holding log, wait and infrastructure settings.

#![warn(missing_docs)]

pub mod duration;
pub mod error;
pub mod loader;
pub mod types;

pub use duration::{ParseDurationError, WaitDuration};
pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE};
pub use types::*;
