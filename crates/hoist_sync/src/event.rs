//! Watch events and the cursor that makes a watch resumable.

use std::fmt;

use futures::stream::BoxStream;

use crate::error::TransportError;

/// A stream of watch events as delivered by one connection.
pub type EventStream<T> = BoxStream<'static, Result<WatchEvent<T>, TransportError>>;

/// Position in a remote event stream.
///
/// An empty cursor means "from the current state"; otherwise the stream
/// resumes strictly after the recorded resource version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCursor(Option<String>);

impl EventCursor {
    /// A cursor positioned at the current state.
    pub fn new() -> Self {
        Self(None)
    }

    /// A cursor positioned after `resource_version`.
    pub fn at(resource_version: impl Into<String>) -> Self {
        let mut cursor = Self::new();
        cursor.advance(&resource_version.into());
        cursor
    }

    /// The resource version to resume after, if any.
    pub fn resource_version(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Returns `true` if no event has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Moves the cursor to `resource_version`. Empty versions are ignored.
    pub fn advance(&mut self, resource_version: &str) {
        if !resource_version.is_empty() {
            self.0 = Some(resource_version.to_string());
        }
    }
}

impl fmt::Display for EventCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(version) => write!(f, "{version}"),
            None => write!(f, "<now>"),
        }
    }
}

/// Objects carrying the resource version a cursor advances to.
pub trait Versioned {
    /// The object's resource version.
    fn resource_version(&self) -> &str;
}

/// Status payload of a stream-level error event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStatus {
    /// Status code reported by the server.
    pub code: u16,
    /// Machine-readable reason.
    pub reason: String,
    /// Human-readable message.
    pub message: String,
}

/// One event delivered by a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent<T> {
    /// An object was created.
    Added(T),
    /// An object was updated.
    Modified(T),
    /// An object was removed.
    Deleted(T),
    /// Progress marker carrying only a resource version.
    Bookmark {
        /// Version the stream has reached.
        resource_version: String,
    },
    /// A stream-level error reported in-band.
    Error(WatchStatus),
}

impl<T: Versioned> WatchEvent<T> {
    /// The object the event is about, for add, modify and delete events.
    pub fn object(&self) -> Option<&T> {
        match self {
            WatchEvent::Added(object) | WatchEvent::Modified(object) | WatchEvent::Deleted(object) => {
                Some(object)
            }
            WatchEvent::Bookmark { .. } | WatchEvent::Error(_) => None,
        }
    }

    /// The resource version the event moves the cursor to.
    pub fn resource_version(&self) -> Option<&str> {
        match self {
            WatchEvent::Bookmark { resource_version } => Some(resource_version),
            WatchEvent::Error(_) => None,
            _ => self.object().map(Versioned::resource_version),
        }
    }
}

/// A namespaced cluster event, as far as the bootstrap wait cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterEvent {
    /// Object name; the completion signal is matched on it.
    pub name: String,
    /// Namespace the event lives in.
    pub namespace: String,
    /// Short machine-readable reason.
    pub reason: String,
    /// Human-readable message.
    pub message: String,
    /// Resource version of the event object.
    pub resource_version: String,
}

impl Versioned for ClusterEvent {
    fn resource_version(&self) -> &str {
        &self.resource_version
    }
}
