//! The bootstrap wait against the cluster described by `auth/kubeconfig`.

use std::path::Path;

use hoist_config::WaitConfig;
use hoist_kube::KubeClient;
use tokio_util::sync::CancellationToken;

/// Waits for the API and then for the bootstrap completion event.
pub async fn wait(
    dir: &Path,
    wait: &WaitConfig,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = KubeClient::from_install_dir(dir)?;
    tracing::debug!(server = client.server(), "using kubeconfig from install directory");
    hoist_sync::wait_for_bootstrap(&client, &wait.to_bootstrap_wait(), cancel).await?;
    Ok(())
}
