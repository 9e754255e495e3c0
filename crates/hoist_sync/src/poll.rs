//! Fixed-interval polling until a check succeeds.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::downsample::LogDownsampler;
use crate::error::{SyncError, TransportError};
use crate::WaitSettings;

/// Calls `check` every `settings.interval` until it returns `Ok(true)`.
///
/// The first check runs immediately. Check failures are transient: they are
/// logged through a [`LogDownsampler`] and retried on the next tick. If the
/// deadline passes, the error is [`SyncError::Unreachable`] when no check
/// ever got an answer and [`SyncError::Unsatisfied`] otherwise.
pub async fn poll_until<F, Fut>(
    settings: &WaitSettings,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<(), SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, TransportError>>,
{
    let deadline = Instant::now() + settings.timeout;
    let mut ticker = interval(settings.interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut downsampler = LogDownsampler::new(settings.log_downsample);
    let mut answered = false;
    let mut last_error: Option<TransportError> = None;

    let expired = |answered: bool, last_error: Option<TransportError>| {
        if answered {
            SyncError::Unsatisfied {
                timeout: settings.timeout,
            }
        } else {
            SyncError::Unreachable {
                timeout: settings.timeout,
                last_error,
            }
        }
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            _ = sleep_until(deadline) => return Err(expired(answered, last_error)),
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            _ = sleep_until(deadline) => return Err(expired(answered, last_error)),
            outcome = check() => outcome,
        };

        match outcome {
            Ok(true) => return Ok(()),
            Ok(false) => answered = true,
            Err(err) => {
                if downsampler.should_log(&err.to_string()) {
                    debug!("still waiting: {err}");
                }
                last_error = Some(err);
            }
        }
    }
}
