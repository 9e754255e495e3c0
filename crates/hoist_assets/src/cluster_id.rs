//! A random identifier for the cluster.

use hoist_asset::{Asset, AssetError, DependencyTable};
use uuid::Uuid;

/// A fresh UUID for the cluster.
///
/// The identifier is not persisted on its own; it survives reruns through the
/// install config that embeds it.
#[derive(Debug, Default)]
pub struct ClusterId {
    /// The identifier in hyphenated form.
    pub id: String,
}

impl Asset for ClusterId {
    fn name(&self) -> &'static str {
        "Cluster ID"
    }

    fn dependencies(&self) -> Vec<Box<dyn Asset>> {
        Vec::new()
    }

    fn generate(&mut self, _parents: &DependencyTable<'_>) -> Result<(), AssetError> {
        self.id = Uuid::new_v4().to_string();
        Ok(())
    }
}
