//! The remote control plane as the bootstrap wait sees it.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::event::{ClusterEvent, EventCursor, EventStream};

/// Version information reported by the API server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerVersion {
    /// Major version, e.g. `"1"`.
    pub major: String,
    /// Minor version, e.g. `"11+"`.
    pub minor: String,
    /// Full build version, e.g. `"v1.11.0+d4cacc0"`.
    pub git_version: String,
}

/// Client operations needed to wait for a cluster to bootstrap.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Queries the server version; any successful answer means reachable.
    async fn server_version(&self) -> Result<ServerVersion, TransportError>;

    /// Opens a watch on events in `namespace`, resuming after `cursor`.
    async fn watch_events(
        &self,
        namespace: &str,
        cursor: EventCursor,
    ) -> Result<EventStream<ClusterEvent>, TransportError>;
}
