//! Typed lookup of resolved dependencies handed to [`Asset::generate`].

use std::collections::HashMap;

use crate::asset::{Asset, AssetId};
use crate::error::AssetError;

/// Read-only view of the already-resolved dependencies of one asset.
///
/// Built by the [`Store`](crate::Store) from its cache right before calling
/// `generate`; it only contains the identities the asset declared.
pub struct DependencyTable<'a> {
    entries: HashMap<AssetId, &'a dyn Asset>,
}

impl<'a> DependencyTable<'a> {
    /// Builds a table from resolved assets.
    pub fn new(assets: impl IntoIterator<Item = &'a dyn Asset>) -> Self {
        let entries = assets
            .into_iter()
            .map(|asset| (AssetId::of_asset(asset), asset))
            .collect();
        Self { entries }
    }

    /// Returns the resolved dependency of type `T`.
    ///
    /// Asking for an undeclared dependency is a bug in the calling asset and
    /// is reported as [`AssetError::MissingDependency`].
    pub fn get<T: Asset>(&self) -> Result<&'a T, AssetError> {
        let missing = || AssetError::MissingDependency {
            dependency: std::any::type_name::<T>(),
        };
        let asset: &'a dyn Asset = *self.entries.get(&AssetId::of::<T>()).ok_or_else(missing)?;
        asset.as_any().downcast_ref::<T>().ok_or_else(missing)
    }

    /// Returns `true` if an asset of type `T` is present.
    pub fn contains<T: Asset>(&self) -> bool {
        self.entries.contains_key(&AssetId::of::<T>())
    }

    /// Number of dependencies in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no dependencies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
