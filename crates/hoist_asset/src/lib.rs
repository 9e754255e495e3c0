//! Dependency-graph asset resolution for cluster installs.
//!
//! An [`Asset`] declares the assets it depends on and knows how to generate its
//! own content from them. A [`Store`] walks that graph depth-first, resolves each
//! asset type at most once, prefers state already persisted in the install
//! directory over regeneration, and writes freshly generated
//! [`WritableAsset`]s back to disk.

#![warn(missing_docs)]

pub mod asset;
pub mod error;
pub mod fetcher;
pub mod persist;
pub mod store;
pub mod table;

pub use asset::{AsAny, Asset, AssetFile, AssetId, WritableAsset};
pub use error::{AssetError, PersistError, StoreError};
pub use fetcher::{DirectoryFetcher, FileFetcher};
pub use persist::persist_to_dir;
pub use store::Store;
pub use table::DependencyTable;
