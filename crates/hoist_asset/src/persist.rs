//! Write side of the persistence bridge.
//!
//! Files are addressed by their relative name only and overwritten in place.
//! Writes are staged next to their targets and renamed into place once every
//! file of the asset has been staged. Targets being replaced are first moved
//! aside, so a failed rename can put the previous contents back and an asset
//! is never left half-written.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::asset::WritableAsset;
use crate::error::PersistError;

/// Suffix appended to staged files before they are renamed into place.
const STAGING_SUFFIX: &str = ".hoist-staged";

/// Suffix of the previous contents while a target is being replaced.
const BACKUP_SUFFIX: &str = ".hoist-previous";

/// Writes every file of `asset` under `directory`.
pub fn persist_to_dir(asset: &dyn WritableAsset, directory: &Path) -> Result<(), PersistError> {
    let name = asset.name();
    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(asset.files().len());

    for file in asset.files() {
        let target = directory.join(&file.filename);
        let staging = staging_path(&target);
        let result = match target.parent() {
            Some(parent) => std::fs::create_dir_all(parent),
            None => Ok(()),
        }
        .and_then(|()| std::fs::write(&staging, &file.data));

        if let Err(source) = result {
            discard(&staged);
            let _ = std::fs::remove_file(&staging);
            return Err(PersistError {
                asset: name,
                path: target,
                source,
            });
        }
        staged.push((staging, target));
    }

    let mut placed: Vec<(&Path, Option<PathBuf>)> = Vec::with_capacity(staged.len());
    for (index, (staging, target)) in staged.iter().enumerate() {
        let result = move_aside(target).and_then(|backup| {
            match std::fs::rename(staging, target) {
                Ok(()) => Ok(backup),
                Err(e) => {
                    if let Some(backup) = &backup {
                        let _ = std::fs::rename(backup, target);
                    }
                    Err(e)
                }
            }
        });
        match result {
            Ok(backup) => placed.push((target, backup)),
            Err(source) => {
                roll_back(&placed);
                discard(&staged[index..]);
                return Err(PersistError {
                    asset: name,
                    path: target.clone(),
                    source,
                });
            }
        }
    }

    for (_, backup) in &placed {
        if let Some(backup) = backup {
            let _ = std::fs::remove_file(backup);
        }
    }

    debug!(asset = name, files = staged.len(), "persisted asset");
    Ok(())
}

/// Renames an existing `target` to its backup path. Only files are moved.
fn move_aside(target: &Path) -> std::io::Result<Option<PathBuf>> {
    match std::fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => {
            return Err(std::io::Error::other("a directory is in the way"));
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    }
    let backup = sibling(target, BACKUP_SUFFIX);
    std::fs::rename(target, &backup)?;
    Ok(Some(backup))
}

/// Restores the previous state of targets that were already replaced.
fn roll_back(placed: &[(&Path, Option<PathBuf>)]) {
    for (target, backup) in placed.iter().rev() {
        match backup {
            Some(backup) => {
                let _ = std::fs::rename(backup, target);
            }
            None => {
                let _ = std::fs::remove_file(target);
            }
        }
    }
}

fn staging_path(target: &Path) -> PathBuf {
    sibling(target, STAGING_SUFFIX)
}

fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(target.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        let _ = std::fs::remove_file(staging);
    }
}
