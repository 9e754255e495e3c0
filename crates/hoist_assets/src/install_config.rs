//! The install config: the cluster description every later asset reads.

use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use serde::{Deserialize, Serialize};

use crate::cluster_id::ClusterId;
use crate::json;
use crate::options::{InstallOptions, Platform};

/// Location of the install config relative to the install directory.
pub const INSTALL_CONFIG_PATH: &str = "install-config.json";

const NETWORK_TYPE: &str = "OpenshiftSDN";
const SERVICE_CIDR: &str = "10.3.0.0/16";
const CLUSTER_CIDR: &str = "10.2.0.0/16";
/// Host bits per node subnet, i.e. a /23 out of the cluster network.
const HOST_SUBNET_LENGTH: u32 = 9;

/// Object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name; for the install config, the cluster name.
    pub name: String,
}

/// Cluster administrator details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    /// Contact address.
    #[serde(default)]
    pub email: String,
    /// Public key authorized for the `core` user.
    #[serde(default)]
    pub ssh_key: String,
}

/// Pod and service networking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    /// Network plugin.
    #[serde(rename = "type")]
    pub network_type: String,
    /// Range service IPs are allocated from.
    #[serde(rename = "serviceCIDR")]
    pub service_cidr: String,
    /// Ranges pod IPs are allocated from.
    pub cluster_networks: Vec<ClusterNetwork>,
}

/// One pod network range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetwork {
    /// The range.
    pub cidr: String,
    /// Host bits of each node's slice of the range.
    pub host_subnet_length: u32,
}

/// A named group of identical machines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachinePool {
    /// `master` or `worker`.
    pub name: String,
    /// Number of machines.
    pub replicas: u32,
}

/// The contents of `install-config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfigData {
    /// Holds the cluster name.
    pub metadata: ObjectMeta,
    /// Unique cluster identifier.
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    /// Administrator details.
    pub admin: Admin,
    /// DNS domain the cluster lives under.
    pub base_domain: String,
    /// Networking settings.
    pub networking: Networking,
    /// Target platform.
    pub platform: Platform,
    /// Registry credentials, as a JSON document.
    pub pull_secret: String,
    /// Machine pools.
    pub machines: Vec<MachinePool>,
}

impl InstallConfigData {
    /// The cluster name.
    pub fn cluster_name(&self) -> &str {
        &self.metadata.name
    }

    /// `<cluster name>.<base domain>`.
    pub fn cluster_domain(&self) -> String {
        format!("{}.{}", self.metadata.name, self.base_domain)
    }

    /// The public API server URL.
    pub fn api_url(&self) -> String {
        format!("https://api.{}:6443", self.cluster_domain())
    }

    /// Replicas of the named machine pool, zero if there is no such pool.
    pub fn replicas(&self, pool: &str) -> u32 {
        self.machines
            .iter()
            .find(|m| m.name == pool)
            .map_or(0, |m| m.replicas)
    }

    fn validate(&self) -> Result<(), AssetError> {
        if self.metadata.name.is_empty() {
            return Err(AssetError::invalid("install config has no cluster name"));
        }
        if self.base_domain.is_empty() {
            return Err(AssetError::invalid("install config has no base domain"));
        }
        if self.replicas("master") == 0 {
            return Err(AssetError::invalid(
                "install config needs at least one master replica",
            ));
        }
        Ok(())
    }
}

/// The install config asset.
#[derive(Debug, Default)]
pub struct InstallConfig {
    /// The config, once resolved.
    pub config: Option<InstallConfigData>,
    file: Option<AssetFile>,
}

impl InstallConfig {
    /// The resolved config, or an error if the asset is still empty.
    pub fn data(&self) -> Result<&InstallConfigData, AssetError> {
        self.config
            .as_ref()
            .ok_or_else(|| AssetError::invalid("install config is not populated"))
    }
}

impl Asset for InstallConfig {
    fn name(&self) -> &'static str {
        "Install Config"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        vec![Box::new(ClusterId::default()), Box::new(InstallOptions::default())]
    }

    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let cluster_id = parents.get::<ClusterId>()?;
        let options = &parents.get::<InstallOptions>()?.data;

        let platform = options
            .platform
            .clone()
            .ok_or_else(|| AssetError::invalid("unknown platform type: none selected"))?;
        let (masters, workers) = match platform {
            Platform::Libvirt { .. } => (1, 1),
            Platform::Aws { .. } | Platform::Openstack { .. } => (3, 3),
        };

        let config = InstallConfigData {
            metadata: ObjectMeta {
                name: options.cluster_name.clone(),
            },
            cluster_id: cluster_id.id.clone(),
            admin: Admin {
                email: options.email.clone(),
                ssh_key: options.ssh_key.clone(),
            },
            base_domain: options.base_domain.clone(),
            networking: Networking {
                network_type: NETWORK_TYPE.to_string(),
                service_cidr: SERVICE_CIDR.to_string(),
                cluster_networks: vec![ClusterNetwork {
                    cidr: CLUSTER_CIDR.to_string(),
                    host_subnet_length: HOST_SUBNET_LENGTH,
                }],
            },
            platform,
            pull_secret: options.pull_secret.clone(),
            machines: vec![
                MachinePool {
                    name: "master".to_string(),
                    replicas: masters,
                },
                MachinePool {
                    name: "worker".to_string(),
                    replicas: workers,
                },
            ],
        };

        self.file = Some(json::to_file(INSTALL_CONFIG_PATH, &config)?);
        self.config = Some(config);
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for InstallConfig {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        let Some(file) = fetcher.fetch_by_name(INSTALL_CONFIG_PATH)? else {
            return Ok(false);
        };
        let config: InstallConfigData = json::from_file(&file)?;
        config.validate()?;
        self.config = Some(config);
        self.file = Some(file);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::InstallOptionsData;

    fn generate(platform: Option<Platform>) -> Result<InstallConfig, AssetError> {
        let id = ClusterId {
            id: "0b0c9d9a-4a2c-4d0f-9f5b-7e1c2f3a4b5c".into(),
        };
        let options = InstallOptions::from_data(InstallOptionsData {
            cluster_name: "demo".into(),
            base_domain: "example.com".into(),
            pull_secret: "{}".into(),
            platform,
            ..Default::default()
        })?;
        let parents = DependencyTable::new([&id as &dyn Asset, &options as &dyn Asset]);
        let mut config = InstallConfig::default();
        config.generate(&parents)?;
        Ok(config)
    }

    #[test]
    fn defaults_for_aws() {
        let asset = generate(Some(Platform::Aws {
            region: "us-east-1".into(),
        }))
        .unwrap();
        let config = asset.data().unwrap();
        assert_eq!(config.networking.network_type, "OpenshiftSDN");
        assert_eq!(config.networking.service_cidr, "10.3.0.0/16");
        assert_eq!(config.networking.cluster_networks[0].cidr, "10.2.0.0/16");
        assert_eq!(config.networking.cluster_networks[0].host_subnet_length, 9);
        assert_eq!(config.replicas("master"), 3);
        assert_eq!(config.replicas("worker"), 3);
        assert_eq!(config.api_url(), "https://api.demo.example.com:6443");
        assert_eq!(asset.files()[0].filename, INSTALL_CONFIG_PATH);
    }

    #[test]
    fn libvirt_uses_single_machines() {
        let asset = generate(Some(Platform::Libvirt {
            uri: "qemu:///system".into(),
        }))
        .unwrap();
        let config = asset.data().unwrap();
        assert_eq!(config.replicas("master"), 1);
        assert_eq!(config.replicas("worker"), 1);
    }

    #[test]
    fn missing_platform_fails() {
        let err = generate(None).unwrap_err();
        assert!(err.to_string().contains("unknown platform type"));
    }

    #[test]
    fn file_uses_wire_field_names() {
        let asset = generate(Some(Platform::Aws {
            region: "us-east-1".into(),
        }))
        .unwrap();
        let text = asset.files()[0].text().unwrap();
        assert!(text.contains("\"clusterID\""));
        assert!(text.contains("\"serviceCIDR\""));
        assert!(text.contains("\"hostSubnetLength\": 9"));
        assert!(text.contains("\"type\": \"aws\""));
    }
}
