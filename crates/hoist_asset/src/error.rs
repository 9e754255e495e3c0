//! Error types for asset generation, loading, persistence and resolution.

use std::path::PathBuf;
use std::sync::Arc;

/// Errors reported by an individual asset's `generate` or `load` step.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// An I/O error occurred while reading persisted asset state.
    #[error("asset I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A persisted file exists but could not be parsed.
    #[error("failed to parse {filename}: {reason}")]
    Parse {
        /// The relative filename of the malformed file.
        filename: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// Dependency content or an external check made generation impossible.
    #[error("{0}")]
    Invalid(String),

    /// The asset asked the dependency table for something it never declared.
    #[error("dependency {dependency} was not declared or not resolved")]
    MissingDependency {
        /// Type name of the requested dependency.
        dependency: &'static str,
    },

    /// Content could not be serialized into its on-disk form.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl AssetError {
    /// Shorthand for [`AssetError::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Shorthand for [`AssetError::Parse`].
    pub fn parse(filename: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            filename: filename.into(),
            reason: reason.to_string(),
        }
    }
}

/// Writing an asset's files to the install directory failed.
#[derive(Debug, thiserror::Error)]
#[error("failed to write asset ({asset}) to disk at {path}: {source}")]
pub struct PersistError {
    /// Name of the asset being persisted.
    pub asset: &'static str,
    /// The file that could not be written.
    pub path: PathBuf,
    /// The underlying I/O error.
    pub source: std::io::Error,
}

/// Errors produced while a [`Store`](crate::Store) resolves an asset graph.
///
/// Resolution outcomes are cached per asset identity, so this type is cheap to
/// clone: the non-cloneable sources sit behind an `Arc`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The asset's `generate` step failed.
    ///
    /// `persist` records a failed best-effort write of whatever partial
    /// content the asset held; the generation failure is still the error.
    #[error("failed to generate {asset}: {source}")]
    Generate {
        /// Name of the failing asset.
        asset: &'static str,
        /// The generation failure.
        source: Arc<AssetError>,
        /// Failure of the best-effort write that followed, if any.
        persist: Option<Arc<PersistError>>,
    },

    /// Persisted state exists for the asset but could not be loaded.
    #[error("failed to load {asset}: {source}")]
    Load {
        /// Name of the asset whose state is malformed.
        asset: &'static str,
        /// The load failure.
        source: Arc<AssetError>,
    },

    /// The asset generated successfully but its files could not be written.
    #[error("{source}")]
    Persist {
        /// Name of the asset.
        asset: &'static str,
        /// The persistence failure.
        source: Arc<PersistError>,
    },

    /// One of the asset's dependencies failed to resolve.
    #[error("failed to fetch dependency of {asset}: {source}")]
    Dependency {
        /// Name of the dependent asset.
        asset: &'static str,
        /// The dependency's own failure.
        source: Box<StoreError>,
    },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected: {}", chain.join(" -> "))]
    Cycle {
        /// Asset names along the cycle, starting and ending with the same asset.
        chain: Vec<&'static str>,
    },
}

impl StoreError {
    /// Returns the innermost error, skipping [`StoreError::Dependency`] wrappers.
    pub fn root_cause(&self) -> &StoreError {
        let mut current = self;
        while let StoreError::Dependency { source, .. } = current {
            current = source;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = AssetError::Io {
            path: PathBuf::from("/install/auth/kubeconfig"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("asset I/O error"));
        assert!(msg.contains("kubeconfig"));
    }

    #[test]
    fn parse_error_display() {
        let err = AssetError::parse("install-config.json", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "failed to parse install-config.json: expected value at line 1"
        );
    }

    #[test]
    fn missing_dependency_display() {
        let err = AssetError::MissingDependency {
            dependency: "hoist_assets::InstallConfig",
        };
        assert!(err.to_string().contains("hoist_assets::InstallConfig"));
    }

    #[test]
    fn persist_error_display() {
        let err = PersistError {
            asset: "Install Config",
            path: PathBuf::from("/install/install-config.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to write asset (Install Config)"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn generate_error_display_ignores_persist() {
        let err = StoreError::Generate {
            asset: "Manifests",
            source: Arc::new(AssetError::invalid("unknown platform")),
            persist: Some(Arc::new(PersistError {
                asset: "Manifests",
                path: PathBuf::from("manifests"),
                source: std::io::Error::new(std::io::ErrorKind::Other, "read-only"),
            })),
        };
        assert_eq!(
            err.to_string(),
            "failed to generate Manifests: unknown platform"
        );
    }

    #[test]
    fn cycle_display() {
        let err = StoreError::Cycle {
            chain: vec!["A", "B", "A"],
        };
        assert_eq!(err.to_string(), "dependency cycle detected: A -> B -> A");
    }

    #[test]
    fn root_cause_unwraps_dependency_chain() {
        let cycle = StoreError::Cycle {
            chain: vec!["A", "B", "A"],
        };
        let wrapped = StoreError::Dependency {
            asset: "C",
            source: Box::new(StoreError::Dependency {
                asset: "B",
                source: Box::new(cycle),
            }),
        };
        assert!(matches!(wrapped.root_cause(), StoreError::Cycle { .. }));
        assert!(wrapped.to_string().contains("dependency of C"));
    }
}
