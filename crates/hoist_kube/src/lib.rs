//! Minimal Kubernetes access for the bootstrap wait.
//!
//! Reads a kubeconfig, builds an HTTPS client from it and implements
//! [`hoist_sync::ControlPlane`] on top of the version endpoint and the
//! namespaced event watch.

#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod kubeconfig;
pub mod stream;

pub use client::KubeClient;
pub use error::KubeError;
pub use kubeconfig::{
    AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
    KUBECONFIG_PATH,
};
pub use stream::WatchEventStream;
