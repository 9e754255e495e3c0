//! User inputs for an install, read from `install-options.toml`.
//!
//! When the file is absent the options are generated from `HOIST_*`
//! environment variables and written out, so later runs reuse them.

use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use serde::{Deserialize, Serialize};

/// Location of the install options relative to the install directory.
pub const INSTALL_OPTIONS_PATH: &str = "install-options.toml";

const DEFAULT_AWS_REGION: &str = "us-east-1";
const DEFAULT_OPENSTACK_REGION: &str = "regionOne";
const DEFAULT_OPENSTACK_CLOUD: &str = "openstack";
const DEFAULT_LIBVIRT_URI: &str = "qemu+tcp://192.168.122.1/system";

/// The infrastructure provider a cluster is installed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Platform {
    /// Amazon Web Services.
    Aws {
        /// Region the cluster is created in.
        region: String,
    },
    /// An OpenStack cloud.
    Openstack {
        /// Region the cluster is created in.
        region: String,
        /// Entry in `clouds.yaml` to authenticate with.
        cloud: String,
    },
    /// Local libvirt virtual machines.
    Libvirt {
        /// libvirt connection URI.
        uri: String,
    },
}

impl Platform {
    /// Short lowercase name, as used in `HOIST_PLATFORM`.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Aws { .. } => "aws",
            Platform::Openstack { .. } => "openstack",
            Platform::Libvirt { .. } => "libvirt",
        }
    }
}

/// The values of `install-options.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallOptionsData {
    /// Cluster name; the first label of every cluster hostname.
    pub cluster_name: String,
    /// DNS domain the cluster lives under.
    pub base_domain: String,
    /// Registry credentials, as a JSON document.
    pub pull_secret: String,
    /// Public key authorized for the `core` user.
    #[serde(default)]
    pub ssh_key: String,
    /// Administrator contact address.
    #[serde(default)]
    pub email: String,
    /// Target platform. Installing requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl InstallOptionsData {
    /// Builds options from `HOIST_*` variables returned by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AssetError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                AssetError::invalid(format!(
                    "{key} is not set; set it or write {INSTALL_OPTIONS_PATH}"
                ))
            })
        };

        let platform = match required("HOIST_PLATFORM")?.to_ascii_lowercase().as_str() {
            "aws" => Platform::Aws {
                region: get("HOIST_AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            },
            "openstack" => Platform::Openstack {
                region: get("HOIST_OPENSTACK_REGION")
                    .unwrap_or_else(|| DEFAULT_OPENSTACK_REGION.to_string()),
                cloud: get("HOIST_OPENSTACK_CLOUD")
                    .unwrap_or_else(|| DEFAULT_OPENSTACK_CLOUD.to_string()),
            },
            "libvirt" => Platform::Libvirt {
                uri: get("HOIST_LIBVIRT_URI").unwrap_or_else(|| DEFAULT_LIBVIRT_URI.to_string()),
            },
            other => {
                return Err(AssetError::invalid(format!(
                    "unknown platform type {other:?} (expected aws, openstack or libvirt)"
                )))
            }
        };

        Ok(Self {
            cluster_name: required("HOIST_CLUSTER_NAME")?,
            base_domain: required("HOIST_BASE_DOMAIN")?,
            pull_secret: required("HOIST_PULL_SECRET")?,
            ssh_key: get("HOIST_SSH_KEY").unwrap_or_default(),
            email: get("HOIST_EMAIL").unwrap_or_default(),
            platform: Some(platform),
        })
    }

    /// Checks the values for consistency.
    pub fn validate(&self) -> Result<(), AssetError> {
        if !is_dns_label(&self.cluster_name) {
            return Err(AssetError::invalid(format!(
                "cluster name {:?} must be a lowercase DNS label",
                self.cluster_name
            )));
        }
        if self.base_domain.is_empty() || !self.base_domain.split('.').all(is_dns_label) {
            return Err(AssetError::invalid(format!(
                "base domain {:?} is not a valid domain",
                self.base_domain
            )));
        }
        if serde_json::from_str::<serde_json::Value>(&self.pull_secret).is_err() {
            return Err(AssetError::invalid("pull secret must be a JSON document"));
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(AssetError::invalid(format!(
                "email {:?} is not an address",
                self.email
            )));
        }
        Ok(())
    }
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}

/// The install options asset.
#[derive(Debug, Default)]
pub struct InstallOptions {
    /// The options, once resolved.
    pub data: InstallOptionsData,
    file: Option<AssetFile>,
}

impl InstallOptions {
    pub(crate) fn from_data(data: InstallOptionsData) -> Result<Self, AssetError> {
        data.validate()?;
        let text = toml::to_string(&data).map_err(|e| AssetError::Serialization {
            reason: format!("{INSTALL_OPTIONS_PATH}: {e}"),
        })?;
        Ok(Self {
            file: Some(AssetFile::new(INSTALL_OPTIONS_PATH, text)),
            data,
        })
    }
}

impl Asset for InstallOptions {
    fn name(&self) -> &'static str {
        "Install Options"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        Vec::new()
    }

    fn generate(&mut self, _parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let data = InstallOptionsData::from_lookup(|key| std::env::var(key).ok())?;
        *self = Self::from_data(data)?;
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for InstallOptions {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        let Some(file) = fetcher.fetch_by_name(INSTALL_OPTIONS_PATH)? else {
            return Ok(false);
        };
        let data: InstallOptionsData =
            toml::from_str(file.text()?).map_err(|e| AssetError::parse(INSTALL_OPTIONS_PATH, e))?;
        data.validate()?;
        self.data = data;
        self.file = Some(file);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("HOIST_CLUSTER_NAME", "demo"),
        ("HOIST_BASE_DOMAIN", "example.com"),
        ("HOIST_PULL_SECRET", r#"{"auths":{}}"#),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        BASE.iter().chain(extra).copied().collect()
    }

    #[test]
    fn from_env_libvirt_defaults() {
        let data = InstallOptionsData::from_lookup(env(&with(&[("HOIST_PLATFORM", "libvirt")]))).unwrap();
        assert_eq!(data.cluster_name, "demo");
        assert_eq!(
            data.platform,
            Some(Platform::Libvirt {
                uri: DEFAULT_LIBVIRT_URI.to_string()
            })
        );
        assert!(data.ssh_key.is_empty());
    }

    #[test]
    fn from_env_aws_region() {
        let data = InstallOptionsData::from_lookup(env(&with(&[
            ("HOIST_PLATFORM", "AWS"),
            ("HOIST_AWS_REGION", "eu-west-1"),
        ])))
        .unwrap();
        assert_eq!(
            data.platform,
            Some(Platform::Aws {
                region: "eu-west-1".into()
            })
        );
    }

    #[test]
    fn from_env_missing_variable() {
        let err = InstallOptionsData::from_lookup(env(&[("HOIST_PLATFORM", "aws")])).unwrap_err();
        assert!(err.to_string().contains("HOIST_CLUSTER_NAME is not set"));
    }

    #[test]
    fn from_env_unknown_platform() {
        let err = InstallOptionsData::from_lookup(env(&with(&[("HOIST_PLATFORM", "azure")])))
            .unwrap_err();
        assert!(err.to_string().contains("unknown platform type \"azure\""));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let good = InstallOptionsData::from_lookup(env(&with(&[("HOIST_PLATFORM", "libvirt")]))).unwrap();
        assert!(good.validate().is_ok());

        let mut bad = good.clone();
        bad.cluster_name = "Demo_1".into();
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.base_domain = "example..com".into();
        assert!(bad.validate().is_err());

        let mut bad = good.clone();
        bad.pull_secret = "not json".into();
        assert!(bad.validate().is_err());

        let mut bad = good;
        bad.email = "nobody".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn toml_round_trip_of_file() {
        let data = InstallOptionsData::from_lookup(env(&with(&[
            ("HOIST_PLATFORM", "openstack"),
            ("HOIST_OPENSTACK_CLOUD", "mycloud"),
        ])))
        .unwrap();
        let asset = InstallOptions::from_data(data.clone()).unwrap();
        let text = asset.files()[0].text().unwrap().to_string();
        assert!(text.contains("type = \"openstack\""));
        assert!(text.contains("cloud = \"mycloud\""));
        let parsed: InstallOptionsData = toml::from_str(&text).unwrap();
        assert_eq!(parsed, data);
    }
}
