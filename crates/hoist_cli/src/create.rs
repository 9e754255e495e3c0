//! `hoist create`: resolve a target's assets, and for `cluster` drive the
//! rest of the install.

use std::path::Path;

use hoist_asset::Store;
use hoist_assets::Target;
use hoist_config::HoistConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{bootstrap, infra, report};

/// Runs `hoist create <target>`.
pub async fn run(
    dir: &Path,
    target: Target,
    config: &HoistConfig,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    resolve(dir, target)?;
    info!("Created {target} in {}", dir.display());

    if target != Target::Cluster {
        return Ok(());
    }

    infra::run_step("apply", &config.infrastructure.apply, dir).await?;
    bootstrap::wait(dir, &config.wait, cancel).await?;
    infra::run_step("destroy bootstrap", &config.infrastructure.destroy_bootstrap, dir).await?;
    report::log_complete(dir)?;
    Ok(())
}

/// Resolves every root asset of `target` with one store.
pub fn resolve(dir: &Path, target: Target) -> Result<Store, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(dir).map_err(|e| format!("creating {}: {e}", dir.display()))?;

    let mut store = Store::new(dir);
    for asset in target.assets() {
        store.fetch(asset)?;
    }
    Ok(store)
}
