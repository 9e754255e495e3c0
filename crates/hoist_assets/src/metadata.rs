//! Cluster metadata kept for later teardown.

use hoist_asset::{Asset, AssetError, AssetFile, DependencyTable, FileFetcher, WritableAsset};
use serde::{Deserialize, Serialize};

use crate::install_config::InstallConfig;
use crate::json;
use crate::options::Platform;

/// Location of the metadata relative to the install directory.
pub const METADATA_PATH: &str = "metadata.json";

/// What a destroy run needs to find the cluster's resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Cluster name.
    pub cluster_name: String,
    /// Cluster identifier.
    #[serde(rename = "clusterID")]
    pub cluster_id: String,
    /// Platform the cluster runs on.
    pub platform: Platform,
}

/// The `metadata.json` asset.
#[derive(Debug, Default)]
pub struct ClusterMetadata {
    /// The metadata, once resolved.
    pub metadata: Option<Metadata>,
    file: Option<AssetFile>,
}

impl Asset for ClusterMetadata {
    fn name(&self) -> &'static str {
        "Metadata"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        vec![Box::new(InstallConfig::default())]
    }

    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        let install = parents.get::<InstallConfig>()?.data()?;
        let metadata = Metadata {
            cluster_name: install.cluster_name().to_string(),
            cluster_id: install.cluster_id.clone(),
            platform: install.platform.clone(),
        };
        self.file = Some(json::to_file(METADATA_PATH, &metadata)?);
        self.metadata = Some(metadata);
        Ok(())
    }

    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        Some(self)
    }

    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        Some(self)
    }
}

impl WritableAsset for ClusterMetadata {
    fn files(&self) -> &[AssetFile] {
        self.file.as_slice()
    }

    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError> {
        let Some(file) = fetcher.fetch_by_name(METADATA_PATH)? else {
            return Ok(false);
        };
        self.metadata = Some(json::from_file(&file)?);
        self.file = Some(file);
        Ok(true)
    }
}
