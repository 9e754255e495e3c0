//! The concrete assets of a cluster install.
//!
//! Each module defines one asset (or one small family of them) on top of the
//! [`hoist_asset`] contracts. [`Target`] groups root assets into the units
//! the command line creates.

#![warn(missing_docs)]

pub mod cluster_id;
pub mod ignition;
pub mod install_config;
pub mod kubeconfig;
pub mod manifests;
pub mod metadata;
pub mod options;
pub mod password;
pub mod target;
pub mod tfvars;

mod json;

pub use cluster_id::ClusterId;
pub use ignition::{BootstrapIgnition, IgnitionConfig, MasterIgnition, WorkerIgnition};
pub use install_config::{InstallConfig, InstallConfigData, MachinePool};
pub use kubeconfig::AdminKubeconfig;
pub use manifests::Manifests;
pub use metadata::ClusterMetadata;
pub use options::{InstallOptions, InstallOptionsData, Platform};
pub use password::KubeadminPassword;
pub use target::Target;
pub use tfvars::TerraformVariables;

pub use hoist_kube::KUBECONFIG_PATH;

/// Location of the kubeadmin password relative to the install directory.
pub const PASSWORD_PATH: &str = "auth/kubeadmin-password";
