//! HTTPS client for the API server.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use hoist_sync::{
    ClusterEvent, ControlPlane, EventCursor, EventStream, ServerVersion, TransportError,
};
use reqwest::{header, Certificate, Client, Identity, Response};
use serde::Deserialize;
use tracing::debug;

use crate::error::KubeError;
use crate::kubeconfig::{decode_field, Kubeconfig};
use crate::stream::WatchEventStream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersion {
    #[serde(default)]
    major: String,
    #[serde(default)]
    minor: String,
    #[serde(default)]
    git_version: String,
}

/// Client for one API server, authenticated from a kubeconfig.
#[derive(Debug, Clone)]
pub struct KubeClient {
    http: Client,
    server: String,
    token: Option<String>,
}

impl KubeClient {
    /// Builds a client for the current context of `config`.
    pub fn from_kubeconfig(config: &Kubeconfig) -> Result<Self, KubeError> {
        let (cluster, user) = config.resolve(None)?;

        let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if is_loopback(&cluster.server) {
            builder = builder.no_proxy();
        }
        if let Some(data) = &cluster.certificate_authority_data {
            let pem = decode_field("certificate-authority-data", data)?;
            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }
        if cluster.insecure_skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let (Some(cert), Some(key)) = (&user.client_certificate_data, &user.client_key_data) {
            let cert = decode_field("client-certificate-data", cert)?;
            let key = decode_field("client-key-data", key)?;
            builder = builder.identity(Identity::from_pkcs8_pem(&cert, &key)?);
        }

        Ok(Self {
            http: builder.build()?,
            server: cluster.server.trim_end_matches('/').to_string(),
            token: user.token.clone(),
        })
    }

    /// Builds a client from the admin kubeconfig of an install directory.
    pub fn from_install_dir(dir: &Path) -> Result<Self, KubeError> {
        Self::from_kubeconfig(&Kubeconfig::load_from_install_dir(dir)?)
    }

    /// The API server URL, without a trailing slash.
    pub fn server(&self) -> &str {
        &self.server
    }

    async fn get(&self, url: String) -> Result<Response, TransportError> {
        let mut request = self.http.get(url).header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }
        Ok(response)
    }
}

fn is_loopback(server: &str) -> bool {
    reqwest::Url::parse(server)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .is_some_and(|host| matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]"))
}

/// URL of the event watch for `namespace`, resuming after `cursor`.
pub(crate) fn watch_url(server: &str, namespace: &str, cursor: &EventCursor) -> String {
    let mut url = format!("{server}/api/v1/namespaces/{namespace}/events?watch=true&allowWatchBookmarks=true");
    if let Some(version) = cursor.resource_version() {
        url.push_str("&resourceVersion=");
        url.push_str(version);
    }
    url
}

#[async_trait]
impl ControlPlane for KubeClient {
    async fn server_version(&self) -> Result<ServerVersion, TransportError> {
        let response = self.get(format!("{}/version", self.server)).await?;
        let raw: RawVersion = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(ServerVersion {
            major: raw.major,
            minor: raw.minor,
            git_version: raw.git_version,
        })
    }

    async fn watch_events(
        &self,
        namespace: &str,
        cursor: EventCursor,
    ) -> Result<EventStream<ClusterEvent>, TransportError> {
        let url = watch_url(&self.server, namespace, &cursor);
        debug!(%url, "opening event watch");
        let response = self.get(url).await?;
        Ok(WatchEventStream::new(response.bytes_stream()).boxed())
    }
}
