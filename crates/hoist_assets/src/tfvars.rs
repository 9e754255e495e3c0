//! Variables handed to the infrastructure tooling.

use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use serde::{Deserialize, Serialize};

use crate::ignition::{BootstrapIgnition, IgnitionConfig, MasterIgnition};
use crate::install_config::{InstallConfig, InstallConfigData};
use crate::json;
use crate::options::Platform;

/// Location of the variables file relative to the install directory.
pub const TFVARS_PATH: &str = "terraform.tfvars.json";

/// Contents of `terraform.tfvars.json`.
///
/// Ignition configs are embedded as JSON strings. Platform fields that do not
/// apply to the selected platform are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TfVars {
    /// Cluster identifier.
    pub cluster_id: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Base DNS domain.
    pub base_domain: String,
    /// Number of master machines.
    pub masters_count: u32,
    /// Bootstrap Ignition config.
    pub ignition_bootstrap: String,
    /// Master Ignition config.
    pub ignition_master: String,
    /// Platform name.
    pub platform: String,
    /// AWS region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    /// OpenStack region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack_region: Option<String>,
    /// OpenStack cloud entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openstack_cloud: Option<String>,
    /// libvirt connection URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libvirt_uri: Option<String>,
}

impl TfVars {
    fn build(
        install: &InstallConfigData,
        bootstrap: &IgnitionConfig,
        master: &IgnitionConfig,
    ) -> Result<Self, AssetError> {
        let encode = |config: &IgnitionConfig| {
            serde_json::to_string(config).map_err(|e| AssetError::Serialization {
                reason: e.to_string(),
            })
        };

        let mut vars = TfVars {
            cluster_id: install.cluster_id.clone(),
            cluster_name: install.cluster_name().to_string(),
            base_domain: install.base_domain.clone(),
            masters_count: install.replicas("master"),
            ignition_bootstrap: encode(bootstrap)?,
            ignition_master: encode(master)?,
            platform: install.platform.name().to_string(),
            ..Default::default()
        };
        match &install.platform {
            Platform::Aws { region } => vars.aws_region = Some(region.clone()),
            Platform::Openstack { region, cloud } => {
                vars.openstack_region = Some(region.clone());
                vars.openstack_cloud = Some(cloud.clone());
            }
            Platform::Libvirt { uri } => vars.libvirt_uri = Some(uri.clone()),
        }
        Ok(vars)
    }
}

/// The `terraform.tfvars.json` asset.
#[derive(Debug, Default)]
pub struct TerraformVariables {
    /// The variables, once resolved.
    pub vars: TfVars,
    file: Option<AssetFile>,
}

impl Asset for TerraformVariables {
    fn name(&self) -> &'static str {
        "Terraform Variables"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        vec![
            Box::new(InstallConfig::default()),
            Box::new(BootstrapIgnition::default()),
            Box::new(MasterIgnition::default()),
        ]
    }

    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let install = parents.get::<InstallConfig>()?.data()?;
        let bootstrap = parents.get::<BootstrapIgnition>()?;
        let master = parents.get::<MasterIgnition>()?;

        let vars = TfVars::build(install, &bootstrap.config, &master.config)?;
        self.file = Some(json::to_file(TFVARS_PATH, &vars)?);
        self.vars = vars;
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for TerraformVariables {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        let Some(file) = fetcher.fetch_by_name(TFVARS_PATH)? else {
            return Ok(false);
        };
        self.vars = json::from_file(&file)?;
        self.file = Some(file);
        Ok(true)
    }
}
