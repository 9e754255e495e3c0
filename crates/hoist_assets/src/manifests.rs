//! Cluster-level manifests handed to the bootstrap control plane.

use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use serde_json::json;
use tracing::debug;

use crate::install_config::{InstallConfig, InstallConfigData};
use crate::json as json_file;
use crate::options::Platform;

/// Directory the manifests live in, relative to the install directory.
pub const MANIFESTS_DIR: &str = "manifests";

const CLUSTER_CONFIG: &str = "manifests/cluster-config.json";
const NETWORK_CONFIG: &str = "manifests/cluster-network-02-config.json";
const INFRASTRUCTURE_CONFIG: &str = "manifests/cluster-infrastructure-02-config.json";

const REQUIRED: [&str; 3] = [CLUSTER_CONFIG, NETWORK_CONFIG, INFRASTRUCTURE_CONFIG];

/// The generated manifests, plus any extra files placed in `manifests/`.
#[derive(Debug, Default)]
pub struct Manifests {
    files: Vec<AssetFile>,
}

impl Manifests {
    fn render(config: &InstallConfigData) -> Result<Vec<AssetFile>, AssetError> {
        let install_config = serde_json::to_string(config).map_err(|e| AssetError::Serialization {
            reason: e.to_string(),
        })?;

        let cluster_config = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": "cluster-config-v1",
                "namespace": "kube-system",
            },
            "data": {
                "install-config": install_config,
            },
        });

        let cluster_networks: Vec<_> = config
            .networking
            .cluster_networks
            .iter()
            .map(|n| json!({ "cidr": n.cidr, "hostPrefix": 32 - n.host_subnet_length }))
            .collect();
        let network = json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "Network",
            "metadata": { "name": "cluster" },
            "spec": {
                "clusterNetwork": cluster_networks,
                "serviceNetwork": [config.networking.service_cidr],
                "networkType": config.networking.network_type,
            },
        });

        let platform = match &config.platform {
            Platform::Aws { .. } => "AWS",
            Platform::Openstack { .. } => "OpenStack",
            Platform::Libvirt { .. } => "Libvirt",
        };
        let infrastructure = json!({
            "apiVersion": "config.openshift.io/v1",
            "kind": "Infrastructure",
            "metadata": { "name": "cluster" },
            "status": {
                "platform": platform,
                "apiServerURL": config.api_url(),
                "etcdDiscoveryDomain": config.cluster_domain(),
            },
        });

        Ok(vec![
            json_file::to_file(CLUSTER_CONFIG, &cluster_config)?,
            json_file::to_file(NETWORK_CONFIG, &network)?,
            json_file::to_file(INFRASTRUCTURE_CONFIG, &infrastructure)?,
        ])
    }
}

impl Asset for Manifests {
    fn name(&self) -> &'static str {
        "Common Manifests"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        vec![Box::new(InstallConfig::default())]
    }

    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let config = parents.get::<InstallConfig>()?.data()?;
        self.files = Self::render(config)?;
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for Manifests {
    fn files(&self) -> &[AssetFile] {
        &self.files
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        let files = fetcher.fetch_dir(MANIFESTS_DIR)?;
        if files.is_empty() {
            return Ok(false);
        }
        for required in REQUIRED {
            let file = files
                .iter()
                .find(|f| f.filename == required)
                .ok_or_else(|| AssetError::parse(required, "missing from manifests directory"))?;
            json_file::from_file::<serde_json::Value>(file)?;
        }
        debug!(files = files.len(), "loaded manifests");
        self.files = files;
        Ok(true)
    }
}
