//! The two-stage bootstrap wait: API reachability, then the completion event.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::control_plane::ControlPlane;
use crate::error::{BootstrapError, TransportError, WaitStage};
use crate::event::{ClusterEvent, WatchEvent};
use crate::poll::poll_until;
use crate::watch::until;
use crate::WaitSettings;

/// Settings for [`wait_for_bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapWait {
    /// Reachability poll of the API server.
    pub api: WaitSettings,
    /// Watch for the completion event. Its interval is the reconnect delay.
    pub events: WaitSettings,
    /// Namespace the completion event is posted in.
    pub namespace: String,
    /// Exact name of the completion event.
    pub completion_event: String,
}

impl Default for BootstrapWait {
    fn default() -> Self {
        Self {
            api: WaitSettings::default(),
            events: WaitSettings::default(),
            namespace: "kube-system".to_string(),
            completion_event: "bootstrap-complete".to_string(),
        }
    }
}

/// Waits until the API answers, then until the completion event is added.
///
/// The stages run one after the other and each gets its own full timeout.
/// The first watch carries no resource version, so an event posted before the
/// watch started still arrives as `Added` and counts.
pub async fn wait_for_bootstrap<C>(
    client: &C,
    wait: &BootstrapWait,
    cancel: &CancellationToken,
) -> Result<(), BootstrapError>
where
    C: ControlPlane + ?Sized,
{
    info!("Waiting {} for the Kubernetes API...", human(wait.api.timeout));
    poll_until(&wait.api, cancel, || async {
        let version = client.server_version().await?;
        info!("API {} up", version.git_version);
        Ok::<_, TransportError>(true)
    })
    .await
    .map_err(|source| BootstrapError {
        stage: WaitStage::Api,
        source,
    })?;

    info!(
        "Waiting {} for the {} event...",
        human(wait.events.timeout),
        wait.completion_event
    );
    let namespace = wait.namespace.as_str();
    until(
        &wait.events,
        cancel,
        move |cursor| client.watch_events(namespace, cursor),
        |event: &WatchEvent<ClusterEvent>| {
            let WatchEvent::Added(added) = event else {
                return Ok(false);
            };
            debug!("added {}: {}", added.name, added.message);
            Ok(added.name == wait.completion_event)
        },
    )
    .await
    .map_err(|source| BootstrapError {
        stage: WaitStage::CompletionEvent,
        source,
    })?;

    Ok(())
}

fn human(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else if duration.subsec_millis() == 0 {
        format!("{secs}s")
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let wait = BootstrapWait::default();
        assert_eq!(wait.api.timeout, Duration::from_secs(1800));
        assert_eq!(wait.events.interval, Duration::from_secs(2));
        assert_eq!(wait.namespace, "kube-system");
        assert_eq!(wait.completion_event, "bootstrap-complete");
    }

    #[test]
    fn human_durations() {
        assert_eq!(human(Duration::from_secs(1800)), "30m");
        assert_eq!(human(Duration::from_secs(7200)), "2h");
        assert_eq!(human(Duration::from_secs(90)), "90s");
        assert_eq!(human(Duration::from_millis(1500)), "1500ms");
    }
}
