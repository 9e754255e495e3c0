//! Ignition configs for the bootstrap, master and worker machines.
//!
//! The bootstrap config carries everything the temporary control plane needs.
//! Master and worker configs are pointer configs that fetch the real config
//! from the cluster's machine config server once it is up.

use std::marker::PhantomData;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use serde::{Deserialize, Serialize};

use crate::install_config::{InstallConfig, InstallConfigData};
use crate::json;
use crate::kubeconfig::AdminKubeconfig;
use crate::manifests::Manifests;

/// Ignition config version written by the installer.
pub const IGNITION_VERSION: &str = "2.2.0";

const MACHINE_CONFIG_PORT: u16 = 22623;
const DATA_URL_PREFIX: &str = "data:text/plain;charset=utf-8;base64,";

const BOOTKUBE_SCRIPT: &str = r#"#!/usr/bin/env bash
set -euo pipefail

export KUBECONFIG=/opt/hoist/auth/kubeconfig

until oc apply --filename=/opt/hoist/manifests/
do
	echo "manifests not applied yet, retrying" >&2
	sleep 5
done

oc --namespace=kube-system create --filename=- <<'EVENT'
{"apiVersion": "v1", "kind": "Event", "metadata": {"name": "bootstrap-complete"}, "involvedObject": {"kind": "Namespace", "name": "kube-system"}, "reason": "BootstrapComplete", "message": "cluster bootstrapped"}
EVENT
"#;

const BOOTKUBE_UNIT: &str = "[Unit]
Description=Bootstrap a Kubernetes cluster
Wants=network-online.target
After=network-online.target

[Service]
WorkingDirectory=/opt/hoist
ExecStart=/usr/local/bin/bootkube.sh
Restart=on-failure
RestartSec=5s

[Install]
WantedBy=multi-user.target
";

/// A complete Ignition config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnitionConfig {
    /// Config version and config references.
    pub ignition: IgnitionMeta,
    /// Files to write.
    #[serde(default)]
    pub storage: Storage,
    /// Users to configure.
    #[serde(default)]
    pub passwd: Passwd,
    /// Units to install.
    #[serde(default)]
    pub systemd: Systemd,
}

/// The `ignition` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnitionMeta {
    /// Ignition config version.
    pub version: String,
    /// Configs merged into this one.
    #[serde(default)]
    pub config: ConfigReferences,
}

/// Remote configs to merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigReferences {
    /// Configs appended to this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<ConfigReference>,
}

/// A remote config location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigReference {
    /// URL of the config.
    pub source: String,
}

/// The `storage` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    /// Files to write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<IgnitionFile>,
}

/// One file written at first boot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnitionFile {
    /// Filesystem label, `root` for the root filesystem.
    pub filesystem: String,
    /// Absolute path.
    pub path: String,
    /// Permission bits.
    pub mode: u32,
    /// Contents source.
    pub contents: FileContents,
}

/// Where a file's contents come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContents {
    /// URL of the contents; generated files use `data:` URLs.
    pub source: String,
}

/// The `passwd` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passwd {
    /// Users to configure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<PasswdUser>,
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswdUser {
    /// Login name.
    pub name: String,
    /// Authorized public keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,
}

/// The `systemd` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Systemd {
    /// Units to install.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

/// A systemd unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit name.
    pub name: String,
    /// Enable the unit.
    #[serde(default)]
    pub enabled: bool,
    /// Unit file contents.
    pub contents: String,
}

impl IgnitionConfig {
    fn new() -> Self {
        Self {
            ignition: IgnitionMeta {
                version: IGNITION_VERSION.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn with_core_user(mut self, ssh_key: &str) -> Self {
        if !ssh_key.is_empty() {
            self.passwd.users.push(PasswdUser {
                name: "core".to_string(),
                ssh_authorized_keys: vec![ssh_key.to_string()],
            });
        }
        self
    }

    fn add_file(&mut self, path: impl Into<String>, mode: u32, data: &[u8]) {
        self.storage.files.push(IgnitionFile {
            filesystem: "root".to_string(),
            path: path.into(),
            mode,
            contents: FileContents {
                source: data_url(data),
            },
        });
    }

    /// Returns the embedded contents of the file at `path`, if it is inline.
    pub fn file_contents(&self, path: &str) -> Option<Vec<u8>> {
        let file = self.storage.files.iter().find(|f| f.path == path)?;
        let encoded = file.contents.source.strip_prefix(DATA_URL_PREFIX)?;
        STANDARD.decode(encoded).ok()
    }

    fn validate(&self, filename: &str) -> Result<(), AssetError> {
        if !self.ignition.version.starts_with("2.") {
            return Err(AssetError::parse(
                filename,
                format!("unsupported ignition version {:?}", self.ignition.version),
            ));
        }
        Ok(())
    }
}

fn data_url(data: &[u8]) -> String {
    format!("{DATA_URL_PREFIX}{}", STANDARD.encode(data))
}

fn load_config(
    fetcher: &dyn FileFetcher,
    filename: &str,
) -> Result<Option<(IgnitionConfig, AssetFile)>, AssetError> {
    let Some(file) = fetcher.fetch_by_name(filename)? else {
        return Ok(None);
    };
    let config: IgnitionConfig = json::from_file(&file)?;
    config.validate(filename)?;
    Ok(Some((config, file)))
}

/// Location of the bootstrap config relative to the install directory.
pub const BOOTSTRAP_IGNITION_PATH: &str = "bootstrap.ign";

/// Ignition config for the temporary bootstrap machine.
#[derive(Debug, Default)]
pub struct BootstrapIgnition {
    /// The config, once resolved.
    pub config: IgnitionConfig,
    file: Option<AssetFile>,
}

impl BootstrapIgnition {
    fn render(
        install: &InstallConfigData,
        manifests: &[AssetFile],
        kubeconfig: &[AssetFile],
    ) -> Result<IgnitionConfig, AssetError> {
        let mut config = IgnitionConfig::new().with_core_user(&install.admin.ssh_key);

        let mut manifests: Vec<&AssetFile> = manifests.iter().collect();
        manifests.sort_by(|a, b| a.filename.cmp(&b.filename));
        for manifest in manifests {
            let name = manifest
                .filename
                .rsplit('/')
                .next()
                .unwrap_or(manifest.filename.as_str());
            config.add_file(format!("/opt/hoist/manifests/{name}"), 0o644, &manifest.data);
        }
        for file in kubeconfig {
            config.add_file(format!("/opt/hoist/{}", file.filename), 0o600, &file.data);
        }
        let install_json = serde_json::to_vec_pretty(install).map_err(|e| {
            AssetError::Serialization {
                reason: e.to_string(),
            }
        })?;
        config.add_file("/opt/hoist/install-config.json", 0o600, &install_json);
        config.add_file("/usr/local/bin/bootkube.sh", 0o555, BOOTKUBE_SCRIPT.as_bytes());
        config.systemd.units.push(Unit {
            name: "bootkube.service".to_string(),
            enabled: true,
            contents: BOOTKUBE_UNIT.to_string(),
        });
        Ok(config)
    }
}

impl Asset for BootstrapIgnition {
    fn name(&self) -> &'static str {
        "Bootstrap Ignition Config"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        vec![
            Box::new(InstallConfig::default()),
            Box::new(Manifests::default()),
            Box::new(AdminKubeconfig::default()),
        ]
    }

    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let install = parents.get::<InstallConfig>()?.data()?;
        let manifests = parents.get::<Manifests>()?;
        let kubeconfig = parents.get::<AdminKubeconfig>()?;

        let config = Self::render(install, manifests.files(), kubeconfig.files())?;
        self.file = Some(json::to_file(BOOTSTRAP_IGNITION_PATH, &config)?);
        self.config = config;
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for BootstrapIgnition {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        match load_config(fetcher, BOOTSTRAP_IGNITION_PATH)? {
            Some((config, file)) => {
                self.config = config;
                self.file = Some(file);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A machine role served by the machine config server.
pub trait MachineRole: Send + Sync + 'static {
    /// Role name in the machine config server URL.
    const ROLE: &'static str;
    /// Asset label.
    const ASSET_NAME: &'static str;
    /// Output file relative to the install directory.
    const FILENAME: &'static str;
}

/// The `master` role.
#[derive(Debug)]
pub struct Master;

impl MachineRole for Master {
    const ROLE: &'static str = "master";
    const ASSET_NAME: &'static str = "Master Ignition Config";
    const FILENAME: &'static str = "master.ign";
}

/// The `worker` role.
#[derive(Debug)]
pub struct Worker;

impl MachineRole for Worker {
    const ROLE: &'static str = "worker";
    const ASSET_NAME: &'static str = "Worker Ignition Config";
    const FILENAME: &'static str = "worker.ign";
}

/// Pointer Ignition config for machines of role `R`.
#[derive(Debug)]
pub struct PointerIgnition<R: MachineRole> {
    /// The config, once resolved.
    pub config: IgnitionConfig,
    file: Option<AssetFile>,
    role: PhantomData<R>,
}

/// Pointer config for master machines.
pub type MasterIgnition = PointerIgnition<Master>;

/// Pointer config for worker machines.
pub type WorkerIgnition = PointerIgnition<Worker>;

impl<R: MachineRole> Default for PointerIgnition<R> {
    fn default() -> Self {
        Self {
            config: IgnitionConfig::default(),
            file: None,
            role: PhantomData,
        }
    }
}

impl<R: MachineRole> PointerIgnition<R> {
    fn render(install: &InstallConfigData) -> IgnitionConfig {
        let mut config = IgnitionConfig::new().with_core_user(&install.admin.ssh_key);
        config.ignition.config.append.push(ConfigReference {
            source: format!(
                "https://api-int.{}:{MACHINE_CONFIG_PORT}/config/{}",
                install.cluster_domain(),
                R::ROLE
            ),
        });
        config
    }
}

impl<R: MachineRole> Asset for PointerIgnition<R> {
    fn name(&self) -> &'static str {
        R::ASSET_NAME
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        vec![Box::new(InstallConfig::default())]
    }

    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let install = parents.get::<InstallConfig>()?.data()?;
        let config = Self::render(install);
        self.file = Some(json::to_file(R::FILENAME, &config)?);
        self.config = config;
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl<R: MachineRole> WritableAsset for PointerIgnition<R> {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        match load_config(fetcher, R::FILENAME)? {
            Some((config, file)) => {
                self.config = config;
                self.file = Some(file);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
