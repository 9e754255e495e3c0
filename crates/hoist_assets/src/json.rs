//! JSON encoding shared by the assets.

use hoist_asset::{AssetError, AssetFile};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes `value` as pretty JSON with a trailing newline.
pub(crate) fn to_file<T: Serialize>(filename: &str, value: &T) -> Result<AssetFile, AssetError> {
    let mut data = serde_json::to_vec_pretty(value).map_err(|e| AssetError::Serialization {
        reason: format!("{filename}: {e}"),
    })?;
    data.push(b'\n');
    Ok(AssetFile::new(filename, data))
}

/// Parses a JSON asset file.
pub(crate) fn from_file<T: DeserializeOwned>(file: &AssetFile) -> Result<T, AssetError> {
    serde_json::from_slice(&file.data).map_err(|e| AssetError::parse(&file.filename, e))
}
