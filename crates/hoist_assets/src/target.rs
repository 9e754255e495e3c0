//! Named groups of root assets created together.

use std::fmt;
use std::str::FromStr;

use hoist_asset::Asset;

use crate::ignition::{BootstrapIgnition, MasterIgnition, WorkerIgnition};
use crate::install_config::InstallConfig;
use crate::kubeconfig::AdminKubeconfig;
use crate::manifests::Manifests;
use crate::metadata::ClusterMetadata;
use crate::password::KubeadminPassword;
use crate::tfvars::TerraformVariables;

/// Something `hoist create` can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `install-config.json`.
    InstallConfig,
    /// The cluster manifests.
    Manifests,
    /// Ignition configs plus the admin credentials.
    IgnitionConfigs,
    /// Everything infrastructure provisioning needs.
    Cluster,
}

impl Target {
    /// Every target, in dependency order.
    pub const ALL: [Target; 4] = [
        Target::InstallConfig,
        Target::Manifests,
        Target::IgnitionConfigs,
        Target::Cluster,
    ];

    /// The command-line name.
    pub fn name(self) -> &'static str {
        match self {
            Target::InstallConfig => "install-config",
            Target::Manifests => "manifests",
            Target::IgnitionConfigs => "ignition-configs",
            Target::Cluster => "cluster",
        }
    }

    /// Fresh root assets for this target.
    pub fn assets(self) -> Vec<Box<dyn Asset>> {
        match self {
            Target::InstallConfig => vec![Box::new(InstallConfig::default())],
            Target::Manifests => vec![Box::new(Manifests::default())],
            Target::IgnitionConfigs => vec![
                Box::new(BootstrapIgnition::default()),
                Box::new(MasterIgnition::default()),
                Box::new(WorkerIgnition::default()),
                Box::new(AdminKubeconfig::default()),
                Box::new(KubeadminPassword::default()),
            ],
            Target::Cluster => vec![
                Box::new(TerraformVariables::default()),
                Box::new(AdminKubeconfig::default()),
                Box::new(KubeadminPassword::default()),
                Box::new(ClusterMetadata::default()),
            ],
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Target::ALL.iter().map(|t| t.name()).collect();
                format!("unknown target {s:?}, expected one of {}", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for target in Target::ALL {
            assert_eq!(target.name().parse::<Target>().unwrap(), target);
        }
    }

    #[test]
    fn unknown_target_lists_choices() {
        let err = "bootstrap".parse::<Target>().unwrap_err();
        assert!(err.contains("install-config, manifests, ignition-configs, cluster"));
    }

    #[test]
    fn ignition_configs_roots() {
        let names: Vec<_> = Target::IgnitionConfigs
            .assets()
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "Bootstrap Ignition Config",
                "Master Ignition Config",
                "Worker Ignition Config",
                "Kubeconfig Admin Client",
                "Kubeadmin Password",
            ]
        );
    }
}
