//! Error types for kubeconfig handling and client construction.

use std::path::PathBuf;

/// Errors loading a kubeconfig or building a client from it.
#[derive(Debug, thiserror::Error)]
pub enum KubeError {
    /// The kubeconfig file could not be read.
    #[error("failed to read kubeconfig {path}: {source}")]
    Read {
        /// Path of the kubeconfig.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The kubeconfig could not be parsed.
    #[error("failed to parse kubeconfig {path}: {source}")]
    Parse {
        /// Path of the kubeconfig.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A context, cluster or user the kubeconfig refers to is missing.
    #[error("kubeconfig has no {kind} named {name:?}")]
    Missing {
        /// What was looked up: `context`, `cluster` or `user`.
        kind: &'static str,
        /// The name looked up.
        name: String,
    },

    /// No context was requested and `current-context` is unset.
    #[error("kubeconfig has no current context")]
    NoCurrentContext,

    /// An embedded credential is not valid base64.
    #[error("invalid base64 in {field}: {source}")]
    Base64 {
        /// The kubeconfig field holding the value.
        field: &'static str,
        /// The decoding error.
        source: base64::DecodeError,
    },

    /// The HTTP client could not be built from the credentials.
    #[error("failed to build client: {0}")]
    Client(#[from] reqwest::Error),
}
