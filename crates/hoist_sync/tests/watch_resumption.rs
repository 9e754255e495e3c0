//! Reconnect, retry and deadline behavior of the resumable watch.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use hoist_sync::{
    until, ClusterEvent, EventCursor, EventStream, SyncError, TransportError, WaitSettings,
    WatchEvent, WatchStatus,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type Item = Result<WatchEvent<ClusterEvent>, TransportError>;

fn added(name: &str, version: &str) -> Item {
    Ok(WatchEvent::Added(ClusterEvent {
        name: name.into(),
        namespace: "kube-system".into(),
        resource_version: version.into(),
        ..Default::default()
    }))
}

fn settings(timeout: u64) -> WaitSettings {
    WaitSettings {
        timeout: Duration::from_secs(timeout),
        interval: Duration::from_secs(2),
        log_downsample: 15,
    }
}

/// Serves one scripted connection per open call and records the cursors asked for.
#[derive(Clone, Default)]
struct Script {
    connections: Arc<Mutex<Vec<Result<Vec<Item>, TransportError>>>>,
    cursors: Arc<Mutex<Vec<EventCursor>>>,
}

impl Script {
    fn new(connections: Vec<Result<Vec<Item>, TransportError>>) -> Self {
        let mut connections = connections;
        connections.reverse();
        Self {
            connections: Arc::new(Mutex::new(connections)),
            cursors: Arc::default(),
        }
    }

    /// Opens the next scripted connection. Once the script runs out, the
    /// stream stays open without delivering anything.
    async fn open(&self, cursor: EventCursor) -> Result<EventStream<ClusterEvent>, TransportError> {
        self.cursors.lock().unwrap().push(cursor);
        let next = self.connections.lock().unwrap().pop();
        match next {
            Some(Ok(items)) => Ok(stream::iter(items).boxed()),
            Some(Err(err)) => Err(err),
            None => Ok(stream::pending().boxed()),
        }
    }

    fn cursors(&self) -> Vec<Option<String>> {
        self.cursors
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.resource_version().map(str::to_string))
            .collect()
    }
}

fn names_until<'a>(
    seen: &'a Mutex<Vec<String>>,
    target: &'a str,
) -> impl FnMut(&WatchEvent<ClusterEvent>) -> Result<bool, hoist_sync::ConditionError> + 'a {
    move |event: &WatchEvent<ClusterEvent>| {
        let name = event.object().map(|e| e.name.clone()).unwrap_or_default();
        seen.lock().unwrap().push(name.clone());
        Ok(name == target)
    }
}

#[tokio::test(start_paused = true)]
async fn resumes_after_disconnect_without_duplicates_or_gaps() {
    let script = Script::new(vec![
        Ok(vec![added("e1", "1"), added("e2", "2")]),
        Ok(vec![added("e3", "3")]),
    ]);
    let seen = Mutex::new(Vec::new());

    let cursor = until(
        &settings(60),
        &CancellationToken::new(),
        |cursor| {
            let script = script.clone();
            async move { script.open(cursor).await }
        },
        names_until(&seen, "e3"),
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["e1", "e2", "e3"]);
    assert_eq!(script.cursors(), vec![None, Some("2".to_string())]);
    assert_eq!(cursor, EventCursor::at("3"));
}

#[tokio::test(start_paused = true)]
async fn transport_error_mid_stream_reconnects_from_cursor() {
    let script = Script::new(vec![
        Ok(vec![
            added("e1", "10"),
            Err(TransportError::Connect("connection reset by peer".into())),
        ]),
        Ok(vec![added("e2", "11")]),
    ]);
    let seen = Mutex::new(Vec::new());
    let start = Instant::now();

    until(
        &settings(60),
        &CancellationToken::new(),
        |cursor| {
            let script = script.clone();
            async move { script.open(cursor).await }
        },
        names_until(&seen, "e2"),
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["e1", "e2"]);
    assert_eq!(script.cursors(), vec![None, Some("10".to_string())]);
    // One retry interval between the broken connection and the next.
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn bookmarks_and_error_events_only_move_the_cursor() {
    let script = Script::new(vec![
        Ok(vec![
            Ok(WatchEvent::Bookmark {
                resource_version: "20".into(),
            }),
            Ok(WatchEvent::Error(WatchStatus {
                code: 500,
                reason: "InternalError".into(),
                message: "etcd leader changed".into(),
            })),
        ]),
        Ok(vec![added("done", "21")]),
    ]);
    let seen = Mutex::new(Vec::new());

    until(
        &settings(60),
        &CancellationToken::new(),
        |cursor| {
            let script = script.clone();
            async move { script.open(cursor).await }
        },
        names_until(&seen, "done"),
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["done"]);
    assert_eq!(script.cursors(), vec![None, Some("20".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn failed_opens_retry_after_delay() {
    let refused = || Err(TransportError::Connect("connection refused".into()));
    let script = Script::new(vec![refused(), refused(), Ok(vec![added("done", "1")])]);
    let seen = Mutex::new(Vec::new());
    let start = Instant::now();

    until(
        &settings(60),
        &CancellationToken::new(),
        |cursor| {
            let script = script.clone();
            async move { script.open(cursor).await }
        },
        names_until(&seen, "done"),
    )
    .await
    .unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(4));
    assert_eq!(script.cursors(), vec![None, None, None]);
}

#[tokio::test(start_paused = true)]
async fn never_opened_times_out_as_unreachable() {
    let script = Script::new(
        (0..100)
            .map(|_| Err(TransportError::Connect("no route to host".into())))
            .collect(),
    );
    let seen = Mutex::new(Vec::new());
    let start = Instant::now();

    let err = until(
        &settings(10),
        &CancellationToken::new(),
        |cursor| {
            let script = script.clone();
            async move { script.open(cursor).await }
        },
        names_until(&seen, "done"),
    )
    .await
    .unwrap_err();

    assert_eq!(start.elapsed(), Duration::from_secs(10));
    match err {
        SyncError::Unreachable { timeout, last_error } => {
            assert_eq!(timeout, Duration::from_secs(10));
            assert!(last_error.is_some());
        }
        other => panic!("expected unreachable, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_a_blocked_read() {
    let script = Script::new(vec![Ok(vec![added("e1", "1")])]);
    let seen = Mutex::new(Vec::new());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });
    let start = Instant::now();

    let err = until(
        &settings(60),
        &cancel,
        |cursor| {
            let script = script.clone();
            async move { script.open(cursor).await }
        },
        names_until(&seen, "never"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::Cancelled));
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert_eq!(*seen.lock().unwrap(), vec!["e1"]);
}

#[tokio::test(start_paused = true)]
async fn expired_cursor_restarts_from_current_state() {
    let script = Script::new(vec![
        Ok(vec![
            added("e1", "30"),
            Ok(WatchEvent::Error(WatchStatus {
                code: 410,
                reason: "Expired".into(),
                message: "too old resource version: 30 (45)".into(),
            })),
            added("unreachable", "31"),
        ]),
        Ok(vec![added("done", "46")]),
    ]);
    let seen = Mutex::new(Vec::new());

    let cursor = until(
        &settings(60),
        &CancellationToken::new(),
        |cursor| {
            let script = script.clone();
            async move { script.open(cursor).await }
        },
        names_until(&seen, "done"),
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["e1", "done"]);
    assert_eq!(script.cursors(), vec![None, None]);
    assert_eq!(cursor, EventCursor::at("46"));
}

#[tokio::test(start_paused = true)]
async fn closing_streams_reopen_once_per_interval_until_deadline() {
    let opens = Arc::new(Mutex::new(0u32));
    let start = Instant::now();

    let err = until(
        &settings(10),
        &CancellationToken::new(),
        |_cursor| {
            let opens = opens.clone();
            async move {
                *opens.lock().unwrap() += 1;
                let closed: Vec<Item> = Vec::new();
                Ok::<_, TransportError>(stream::iter(closed).boxed())
            }
        },
        |_: &WatchEvent<ClusterEvent>| Ok(false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::Unsatisfied { .. }));
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    // Opens at 0, 2, 4, 6 and 8 seconds.
    assert_eq!(*opens.lock().unwrap(), 5);
}

#[tokio::test(start_paused = true)]
async fn expired_cursor_loop_times_out_on_schedule() {
    let opens = Arc::new(Mutex::new(0u32));
    let start = Instant::now();

    let err = until(
        &settings(10),
        &CancellationToken::new(),
        |_cursor| {
            let opens = opens.clone();
            async move {
                *opens.lock().unwrap() += 1;
                let expired: Vec<Item> = vec![Ok(WatchEvent::Error(WatchStatus {
                    code: 410,
                    reason: "Expired".into(),
                    message: "too old resource version".into(),
                }))];
                Ok::<_, TransportError>(stream::iter(expired).boxed())
            }
        },
        |_: &WatchEvent<ClusterEvent>| Ok(false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::Unsatisfied { .. }));
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    // Opens at 0, 2, 4, 6 and 8 seconds.
    assert_eq!(*opens.lock().unwrap(), 5);
}
