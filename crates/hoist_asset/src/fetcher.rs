//! Read side of the persistence bridge.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::asset::AssetFile;
use crate::error::AssetError;

/// Source of previously persisted asset files.
pub trait FileFetcher {
    /// Reads the file with the given relative name.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    fn fetch_by_name(&self, name: &str) -> Result<Option<AssetFile>, AssetError>;

    /// Reads every regular file directly inside the relative directory `dir`,
    /// sorted by filename. Returns an empty list when the directory is absent.
    fn fetch_dir(&self, dir: &str) -> Result<Vec<AssetFile>, AssetError>;
}

/// [`FileFetcher`] over an install directory on the local filesystem.
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    /// Creates a fetcher rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The directory files are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileFetcher for DirectoryFetcher {
    fn fetch_by_name(&self, name: &str) -> Result<Option<AssetFile>, AssetError> {
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(AssetFile::new(name, data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AssetError::Io { path, source: e }),
        }
    }

    fn fetch_dir(&self, dir: &str) -> Result<Vec<AssetFile>, AssetError> {
        let path = self.root.join(dir);
        let entries = match std::fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AssetError::Io { path, source: e }),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AssetError::Io {
                path: path.clone(),
                source: e,
            })?;
            let is_file = entry
                .file_type()
                .map_err(|e| AssetError::Io {
                    path: entry.path(),
                    source: e,
                })?
                .is_file();
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let relative = format!("{}/{}", dir.trim_end_matches('/'), name);
            if let Some(file) = self.fetch_by_name(&relative)? {
                files.push(file);
            }
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fetcher() -> (tempfile::TempDir, DirectoryFetcher) {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DirectoryFetcher::new(dir.path());
        (dir, fetcher)
    }

    #[test]
    fn fetch_missing_returns_none() {
        let (_dir, fetcher) = make_fetcher();
        assert!(fetcher.fetch_by_name("install-config.json").unwrap().is_none());
    }

    #[test]
    fn fetch_existing_file() {
        let (dir, fetcher) = make_fetcher();
        std::fs::create_dir_all(dir.path().join("auth")).unwrap();
        std::fs::write(dir.path().join("auth/kubeadmin-password"), "pw").unwrap();

        let file = fetcher.fetch_by_name("auth/kubeadmin-password").unwrap().unwrap();
        assert_eq!(file.filename, "auth/kubeadmin-password");
        assert_eq!(file.data, b"pw");
    }

    #[test]
    fn fetch_directory_path_as_file_is_io_error() {
        let (dir, fetcher) = make_fetcher();
        std::fs::create_dir_all(dir.path().join("manifests")).unwrap();
        let err = fetcher.fetch_by_name("manifests").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn fetch_dir_sorted_and_files_only() {
        let (dir, fetcher) = make_fetcher();
        let manifests = dir.path().join("manifests");
        std::fs::create_dir_all(manifests.join("nested")).unwrap();
        std::fs::write(manifests.join("b.json"), "{}").unwrap();
        std::fs::write(manifests.join("a.json"), "[]").unwrap();

        let files = fetcher.fetch_dir("manifests").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["manifests/a.json", "manifests/b.json"]);
    }

    #[test]
    fn fetch_dir_missing_is_empty() {
        let (_dir, fetcher) = make_fetcher();
        assert!(fetcher.fetch_dir("manifests").unwrap().is_empty());
    }
}
