//! The kubeconfig file format, limited to what the installer reads and writes.
//!
//! Files are stored as JSON, which every kubeconfig reader also accepts.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::KubeError;

/// Location of the admin kubeconfig relative to the install directory.
pub const KUBECONFIG_PATH: &str = "auth/kubeconfig";

/// A client configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Kubeconfig {
    /// Always `v1`.
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,
    /// Always `Config`.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Known clusters.
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    /// Known credentials.
    #[serde(default)]
    pub users: Vec<NamedAuthInfo>,
    /// Cluster and user pairings.
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    /// Context used when none is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

/// A cluster entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    /// Entry name.
    pub name: String,
    /// Connection details.
    pub cluster: Cluster,
}

/// How to reach an API server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    /// API server URL.
    pub server: String,
    /// Base64-encoded PEM bundle trusted for the server certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
    /// Skip server certificate verification.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure_skip_tls_verify: bool,
}

/// A user entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAuthInfo {
    /// Entry name.
    pub name: String,
    /// Credentials.
    pub user: AuthInfo,
}

/// Credentials presented to the API server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthInfo {
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Base64-encoded PEM client certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate_data: Option<String>,
    /// Base64-encoded PEM client key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
}

/// A context entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    /// Entry name.
    pub name: String,
    /// The pairing.
    pub context: Context,
}

/// A cluster and user pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Name of a [`NamedCluster`].
    pub cluster: String,
    /// Name of a [`NamedAuthInfo`].
    pub user: String,
    /// Default namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Kubeconfig {
    /// Reads and parses a kubeconfig file.
    pub fn load(path: &Path) -> Result<Self, KubeError> {
        let contents = std::fs::read_to_string(path).map_err(|source| KubeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| KubeError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the admin kubeconfig of an install directory.
    pub fn load_from_install_dir(dir: &Path) -> Result<Self, KubeError> {
        Self::load(&dir.join(KUBECONFIG_PATH))
    }

    /// Returns the cluster and user of `context`, or of the current context.
    pub fn resolve(&self, context: Option<&str>) -> Result<(&Cluster, &AuthInfo), KubeError> {
        let context_name = context
            .or(self.current_context.as_deref())
            .ok_or(KubeError::NoCurrentContext)?;
        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| missing("context", context_name))?;
        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.context.cluster)
            .ok_or_else(|| missing("cluster", &context.context.cluster))?;
        let user = self
            .users
            .iter()
            .find(|u| u.name == context.context.user)
            .ok_or_else(|| missing("user", &context.context.user))?;
        Ok((&cluster.cluster, &user.user))
    }
}

fn missing(kind: &'static str, name: &str) -> KubeError {
    KubeError::Missing {
        kind,
        name: name.to_string(),
    }
}

/// Decodes a base64 credential field.
pub(crate) fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, KubeError> {
    STANDARD
        .decode(value.trim())
        .map_err(|source| KubeError::Base64 { field, source })
}
