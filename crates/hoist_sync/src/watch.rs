//! Resumable watch: consume an event stream until a condition holds.

use std::future::Future;

use futures::StreamExt;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::downsample::LogDownsampler;
use crate::error::{ConditionError, SyncError, TransportError};
use crate::event::{EventCursor, EventStream, Versioned, WatchEvent};
use crate::WaitSettings;

/// HTTP status of an in-band watch error for an expired resource version.
const GONE: u16 = 410;

/// Watches a stream until `condition` returns `true`.
///
/// `open` is called with the cursor of the last event seen (empty at first)
/// and must return a stream resuming strictly after it. A failed open is
/// retried after `settings.interval`. A stream that ends or fails mid-way is
/// reopened from the current cursor after the same delay, so `condition`
/// sees every event once and in order.
///
/// The cursor is advanced before `condition` runs. Bookmarks only advance
/// the cursor and in-band error events are logged and skipped, except
/// `410 Gone`: the cursor has expired on the server, so it is dropped and the
/// next connection starts from the current state. On success the cursor of
/// the satisfying event is returned.
pub async fn until<T, O, Fut, C>(
    settings: &WaitSettings,
    cancel: &CancellationToken,
    mut open: O,
    mut condition: C,
) -> Result<EventCursor, SyncError>
where
    T: Versioned,
    O: FnMut(EventCursor) -> Fut,
    Fut: Future<Output = Result<EventStream<T>, TransportError>>,
    C: FnMut(&WatchEvent<T>) -> Result<bool, ConditionError>,
{
    let deadline = Instant::now() + settings.timeout;
    let mut cursor = EventCursor::new();
    let mut connected = false;
    let mut last_error: Option<TransportError> = None;
    let mut downsampler = LogDownsampler::new(settings.log_downsample);

    let expired = |connected: bool, last_error: Option<TransportError>| {
        if connected {
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
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            _ = sleep_until(deadline) => return Err(expired(connected, last_error)),
            opened = open(cursor.clone()) => opened,
        };

        let mut stream = match opened {
            Ok(stream) => {
                debug!(cursor = %cursor, "watch opened");
                connected = true;
                downsampler.reset();
                stream
            }
            Err(err) => {
                if downsampler.should_log(&err.to_string()) {
                    warn!("failed to open watch: {err}");
                }
                last_error = Some(err);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                    _ = sleep_until(deadline) => return Err(expired(connected, last_error)),
                    _ = sleep(settings.interval) => {}
                }
                continue;
            }
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                _ = sleep_until(deadline) => return Err(expired(connected, last_error)),
                next = stream.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(err)) => {
                    if downsampler.should_log(&err.to_string()) {
                        debug!(cursor = %cursor, "watch interrupted, resuming: {err}");
                    }
                    last_error = Some(err);
                    break;
                }
                None => {
                    debug!(cursor = %cursor, "watch closed, resuming");
                    break;
                }
            };

            match &event {
                WatchEvent::Error(status) if status.code == GONE => {
                    warn!(cursor = %cursor, "watch cursor expired, restarting from current state: {}", status.message);
                    cursor = EventCursor::new();
                    break;
                }
                WatchEvent::Error(status) => {
                    debug!(code = status.code, reason = %status.reason, "watch error event: {}", status.message);
                    continue;
                }
                WatchEvent::Bookmark { resource_version } => {
                    cursor.advance(resource_version);
                    continue;
                }
                _ => {
                    if let Some(version) = event.resource_version() {
                        cursor.advance(version);
                    }
                }
            }

            if condition(&event).map_err(SyncError::Condition)? {
                return Ok(cursor);
            }
        }
        drop(stream);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            _ = sleep_until(deadline) => return Err(expired(connected, last_error)),
            _ = sleep(settings.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::stream;

    use super::*;
    use crate::event::ClusterEvent;

    fn added(name: &str, version: &str) -> Result<WatchEvent<ClusterEvent>, TransportError> {
        Ok(WatchEvent::Added(ClusterEvent {
            name: name.into(),
            resource_version: version.into(),
            ..Default::default()
        }))
    }

    fn settings() -> WaitSettings {
        WaitSettings {
            timeout: Duration::from_secs(60),
            interval: Duration::from_secs(2),
            log_downsample: 15,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_cursor_of_matching_event() {
        let cancel = CancellationToken::new();
        let cursor = until(
            &settings(),
            &cancel,
            |_| async {
                let events = vec![added("a", "1"), added("done", "2"), added("b", "3")];
                Ok::<_, TransportError>(stream::iter(events).chain(stream::pending()).boxed())
            },
            |event: &WatchEvent<ClusterEvent>| Ok(event.object().is_some_and(|e| e.name == "done")),
        )
        .await
        .unwrap();
        assert_eq!(cursor, EventCursor::at("2"));
    }

    #[tokio::test(start_paused = true)]
    async fn condition_error_aborts() {
        let cancel = CancellationToken::new();
        let err = until(
            &settings(),
            &cancel,
            |_| async { Ok::<_, TransportError>(stream::iter(vec![added("a", "1")]).chain(stream::pending()).boxed()) },
            |_: &WatchEvent<ClusterEvent>| Err("unexpected event".into()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::Condition(e) if e.to_string() == "unexpected event"));
    }

    #[tokio::test(start_paused = true)]
    async fn connected_but_unsatisfied_times_out() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let err = until(
            &settings(),
            &cancel,
            |_| async { Ok::<_, TransportError>(stream::iter(vec![added("a", "1")]).chain(stream::pending()).boxed()) },
            |_: &WatchEvent<ClusterEvent>| Ok(false),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::Unsatisfied { .. }));
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }
}
