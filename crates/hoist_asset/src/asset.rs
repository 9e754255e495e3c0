//! The asset contracts and the identity/file types they share.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::AssetError;
use crate::fetcher::FileFetcher;
use crate::table::DependencyTable;

/// Upcast to [`Any`], implemented for every `'static` type.
///
/// Call it through `&dyn Asset` (never through a `Box<dyn Asset>` or a double
/// reference) so that the concrete asset type is the one that answers.
pub trait AsAny {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A named, typed unit of derivable install state.
///
/// The resolver creates every asset empty (see [`Asset::dependencies`]) and
/// populates it exactly once, either from persisted state or by calling
/// [`Asset::generate`]. Once populated the asset is not mutated again.
pub trait Asset: AsAny + 'static {
    /// Human-readable label used in diagnostics.
    fn name(&self) -> &'static str;

    /// Empty instances of every asset this one reads during `generate`.
    ///
    /// The order defines resolution order.
    fn dependencies(&self) -> Vec<Box<dyn Asset>>;

    /// Computes this asset's content strictly from its resolved dependencies.
    fn generate(&mut self, parents: &DependencyTable<'_>) -> Result<(), AssetError>;

    /// Returns the writable view of this asset, if it has one.
    fn as_writable(&self) -> Option<&dyn WritableAsset> {
        None
    }

    /// Mutable counterpart of [`Asset::as_writable`].
    fn as_writable_mut(&mut self) -> Option<&mut dyn WritableAsset> {
        None
    }
}

/// An asset with a durable on-disk form.
pub trait WritableAsset: Asset {
    /// Files to persist, in write order. Empty until the asset is populated.
    fn files(&self) -> &[AssetFile];

    /// Rebuilds the asset from previously persisted files.
    ///
    /// Returns `Ok(false)` when no prior state exists. An error means state
    /// exists but is malformed, and must not be papered over by regenerating.
    fn load(&mut self, fetcher: &dyn FileFetcher) -> Result<bool, AssetError>;
}

/// Stable identity of an asset: one per concrete asset type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(TypeId);

impl AssetId {
    /// Identity of the asset type `T`.
    pub fn of<T: Asset>() -> Self {
        Self(TypeId::of::<T>())
    }

    /// Identity of the concrete type behind `asset`.
    pub fn of_asset(asset: &dyn Asset) -> Self {
        Self(asset.as_any().type_id())
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({:?})", self.0)
    }
}

/// One file of an asset's durable form: a path relative to the install
/// directory plus its bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Path relative to the install directory, `/`-separated.
    pub filename: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl AssetFile {
    /// Creates a file from a relative name and its contents.
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Returns the contents as UTF-8, or a parse error naming the file.
    pub fn text(&self) -> Result<&str, AssetError> {
        std::str::from_utf8(&self.data).map_err(|e| AssetError::parse(&self.filename, e))
    }
}

impl fmt::Debug for AssetFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetFile({}, {} bytes)", self.filename, self.data.len())
    }
}
