//! The resolver: memoized, load-preferring, depth-first asset resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::asset::{Asset, AssetId, WritableAsset};
use crate::error::{PersistError, StoreError};
use crate::fetcher::DirectoryFetcher;
use crate::persist::persist_to_dir;
use crate::table::DependencyTable;

/// A resolved (or failed) asset together with the outcome of resolving it.
struct CacheEntry {
    asset: Box<dyn Asset>,
    outcome: Result<(), StoreError>,
}

/// Resolves assets against one install directory.
///
/// Each asset identity is loaded or generated at most once per `Store`, no
/// matter how many paths in the graph reach it. Failures are cached too, so a
/// failed asset is never retried within the same store. Two stores over the
/// same directory share nothing but the files on disk.
pub struct Store {
    directory: PathBuf,
    fetcher: DirectoryFetcher,
    cache: HashMap<AssetId, CacheEntry>,
    /// Assets whose dependencies are being resolved, outermost first.
    in_progress: Vec<(AssetId, &'static str)>,
}

impl Store {
    /// Creates a store that loads from and persists to `directory`.
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            fetcher: DirectoryFetcher::new(directory),
            cache: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// The install directory backing this store.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Resolves `asset` and everything it transitively depends on.
    ///
    /// The populated asset stays in the store's cache, even on failure, and
    /// can be read back with [`Store::get`] or [`Store::get_by_id`].
    pub fn fetch(&mut self, asset: Box<dyn Asset>) -> Result<AssetId, StoreError> {
        self.resolve(asset)
    }

    /// Returns the cached asset of type `T`, if it has been fetched.
    pub fn get<T: Asset>(&self) -> Option<&T> {
        let asset = self.get_by_id(AssetId::of::<T>())?;
        asset.as_any().downcast_ref::<T>()
    }

    /// Returns the cached asset with the given identity, if it has been fetched.
    pub fn get_by_id(&self, id: AssetId) -> Option<&dyn Asset> {
        self.cache.get(&id).map(|entry| &*entry.asset)
    }

    /// Number of asset identities resolved so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns `true` if nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn resolve(&mut self, asset: Box<dyn Asset>) -> Result<AssetId, StoreError> {
        let id = AssetId::of_asset(asset.as_ref());
        let name = asset.name();

        if let Some(entry) = self.cache.get(&id) {
            debug!(asset = name, "reusing resolved asset");
            return entry.outcome.clone().map(|()| id);
        }

        if let Some(start) = self.in_progress.iter().position(|(open, _)| *open == id) {
            let mut chain: Vec<&'static str> =
                self.in_progress[start..].iter().map(|(_, n)| *n).collect();
            chain.push(name);
            return Err(StoreError::Cycle { chain });
        }

        debug!(asset = name, "fetching");
        self.in_progress.push((id, name));

        let mut resolved = Vec::new();
        let mut failure = None;
        for dependency in asset.dependencies() {
            match self.resolve(dependency) {
                Ok(dep_id) => resolved.push(dep_id),
                Err(err) => {
                    if failure.is_none() {
                        failure = Some(StoreError::Dependency {
                            asset: name,
                            source: Box::new(err),
                        });
                    }
                }
            }
        }

        self.in_progress.pop();

        let mut asset = asset;
        let outcome = match failure {
            Some(err) => Err(err),
            None => self.populate(asset.as_mut(), &resolved),
        };

        self.cache.insert(
            id,
            CacheEntry {
                asset,
                outcome: outcome.clone(),
            },
        );
        outcome.map(|()| id)
    }

    /// Loads `asset` from disk or generates it from its resolved dependencies.
    fn populate(&self, asset: &mut dyn Asset, dependencies: &[AssetId]) -> Result<(), StoreError> {
        let name = asset.name();

        if let Some(writable) = asset.as_writable_mut() {
            match writable.load(&self.fetcher) {
                Ok(true) => {
                    debug!(asset = name, "loaded from install directory");
                    return Ok(());
                }
                Ok(false) => {}
                Err(source) => {
                    return Err(StoreError::Load {
                        asset: name,
                        source: Arc::new(source),
                    })
                }
            }
        }

        let parents = DependencyTable::new(
            dependencies
                .iter()
                .filter_map(|id| self.cache.get(id))
                .map(|entry| &*entry.asset),
        );

        debug!(asset = name, "generating");
        let generated = asset.generate(&parents);

        let writable = match asset.as_writable() {
            Some(writable) => writable,
            None => {
                return generated.map_err(|source| StoreError::Generate {
                    asset: name,
                    source: Arc::new(source),
                    persist: None,
                })
            }
        };

        match generated {
            Ok(()) => persist_to_dir(writable, &self.directory).map_err(|source| {
                StoreError::Persist {
                    asset: name,
                    source: Arc::new(source),
                }
            }),
            Err(source) => {
                let persist = self.persist_partial(writable);
                Err(StoreError::Generate {
                    asset: name,
                    source: Arc::new(source),
                    persist,
                })
            }
        }
    }

    /// Best-effort write of whatever a failed asset holds, for debugging.
    fn persist_partial(&self, writable: &dyn WritableAsset) -> Option<Arc<PersistError>> {
        if writable.files().is_empty() {
            return None;
        }
        match persist_to_dir(writable, &self.directory) {
            Ok(()) => {
                debug!(asset = writable.name(), "persisted partial content after failure");
                None
            }
            Err(err) => {
                warn!("{err}");
                Some(Arc::new(err))
            }
        }
    }
}
