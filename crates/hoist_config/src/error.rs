//! Errors from reading `hoist.toml`.

use std::path::PathBuf;

/// Why a `hoist.toml` could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists (or was named explicitly) but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The content is not valid TOML for [`HoistConfig`](crate::HoistConfig).
    #[error("malformed hoist.toml: {0}")]
    Parse(String),

    /// A value parsed but cannot drive an install.
    #[error("hoist.toml: {key} {problem}")]
    Invalid {
        /// Dotted key, e.g. `wait.poll_interval`.
        key: &'static str,
        /// What is wrong with it.
        problem: &'static str,
    },
}
