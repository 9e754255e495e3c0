//! Decoder for the newline-delimited JSON of a Kubernetes watch response.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;
use hoist_sync::{ClusterEvent, TransportError, WatchEvent, WatchStatus};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawWatchEvent {
    #[serde(rename = "type")]
    kind: String,
    object: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    resource_version: String,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

/// Stream adapter turning a watch response body into [`WatchEvent`]s.
///
/// Lines may be split across body chunks; blank lines are skipped. A body
/// error ends the current connection from the caller's point of view and is
/// reported as [`TransportError::Connect`].
pub struct WatchEventStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    buffer: Vec<u8>,
    /// Set once the body has ended; the body is never polled again.
    done: bool,
}

impl WatchEventStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            done: false,
        }
    }
}

impl Stream for WatchEventStream {
    type Item = Result<WatchEvent<ClusterEvent>, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        loop {
            if let Some(event) = take_line(&mut this.buffer) {
                return Poll::Ready(Some(event));
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(TransportError::Connect(e.to_string()))));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    // A final line may lack its newline.
                    let rest = std::mem::take(&mut this.buffer);
                    return Poll::Ready(decode_bytes(&rest));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Removes and decodes the first complete non-blank line of `buffer`.
fn take_line(buffer: &mut Vec<u8>) -> Option<Result<WatchEvent<ClusterEvent>, TransportError>> {
    while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=newline).collect();
        if let Some(event) = decode_bytes(&line) {
            return Some(event);
        }
    }
    None
}

fn decode_bytes(line: &[u8]) -> Option<Result<WatchEvent<ClusterEvent>, TransportError>> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            return Some(Err(TransportError::Decode(format!(
                "invalid UTF-8 in watch stream: {e}"
            ))))
        }
    };
    if text.is_empty() {
        return None;
    }
    Some(decode_line(text))
}

/// Decodes one watch line.
pub(crate) fn decode_line(line: &str) -> Result<WatchEvent<ClusterEvent>, TransportError> {
    let raw: RawWatchEvent = serde_json::from_str(line).map_err(|e| decode_error(&e, line))?;

    let event = |object: serde_json::Value| -> Result<ClusterEvent, TransportError> {
        let raw: RawEvent = serde_json::from_value(object).map_err(|e| decode_error(&e, line))?;
        Ok(ClusterEvent {
            name: raw.metadata.name,
            namespace: raw.metadata.namespace,
            reason: raw.reason,
            message: raw.message,
            resource_version: raw.metadata.resource_version,
        })
    };

    match raw.kind.as_str() {
        "ADDED" => Ok(WatchEvent::Added(event(raw.object)?)),
        "MODIFIED" => Ok(WatchEvent::Modified(event(raw.object)?)),
        "DELETED" => Ok(WatchEvent::Deleted(event(raw.object)?)),
        "BOOKMARK" => {
            let raw: RawEvent =
                serde_json::from_value(raw.object).map_err(|e| decode_error(&e, line))?;
            Ok(WatchEvent::Bookmark {
                resource_version: raw.metadata.resource_version,
            })
        }
        "ERROR" => {
            let status: RawStatus =
                serde_json::from_value(raw.object).map_err(|e| decode_error(&e, line))?;
            Ok(WatchEvent::Error(WatchStatus {
                code: status.code,
                reason: status.reason,
                message: status.message,
            }))
        }
        other => Err(TransportError::Decode(format!(
            "unknown watch event type {other:?}"
        ))),
    }
}

fn decode_error(e: &serde_json::Error, line: &str) -> TransportError {
    TransportError::Decode(format!("{e} (line: {})", truncate(line, 200)))
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let end = (0..=max).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
    &text[..end]
}
