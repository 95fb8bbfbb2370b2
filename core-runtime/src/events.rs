//! # Event Bus System
//!
//! Provides an event-driven architecture for the player core using `tokio::sync::broadcast`.
//! Stores and the playback session publish typed events; the host UI and the
//! service façade subscribe to them.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for different domains
//! - **Notices**: Structured user feedback (`kind`, `title`, `message`) that
//!   the host presents however it likes (toast, alert, banner)
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐
//! │ Playback Session ├──────────>│           │
//! └──────────────────┘           │           │    subscribe    ┌────────────┐
//! ┌──────────────────┐   emit    │ EventBus  ├────────────────>│  Host UI   │
//! │  Playlist Store  ├──────────>│ (broadcast│                 └────────────┘
//! └──────────────────┘           │  channel) │    subscribe    ┌────────────┐
//! ┌──────────────────┐   emit    │           ├────────────────>│ Play counts│
//! │ Map Overlay State├──────────>│           │                 └────────────┘
//! └──────────────────┘           └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, Notice};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Notice(Notice::success("Success", "Playlist created")))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert!(matches!(event, CoreEvent::Notice(_)));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Publishers ignore the "no subscribers" error from [`EventBus::emit`]: a
//! notice nobody listens to is simply dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Transport and progress events from the playback session
    Playback(PlaybackEvent),
    /// Playlist and play-history changes
    Library(LibraryEvent),
    /// Saved credential changes
    Account(AccountEvent),
    /// Map overlay and connectivity changes
    Device(DeviceEvent),
    /// User-facing feedback
    Notice(Notice),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Account(e) => e.description(),
            CoreEvent::Device(e) => e.description(),
            CoreEvent::Notice(n) => &n.title,
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Library(LibraryEvent::DownloadFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Library(LibraryEvent::DownloadProgress { .. }) => EventSeverity::Debug,
            CoreEvent::Notice(Notice {
                kind: NoticeKind::Error,
                ..
            }) => EventSeverity::Error,
            CoreEvent::Notice(_) => EventSeverity::Info,
            CoreEvent::Device(DeviceEvent::ConnectivityChanged { is_online: false, .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Playback(PlaybackEvent::PositionChanged { .. }) => EventSeverity::Debug,
            CoreEvent::Playback(_) | CoreEvent::Library(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Notices
// ============================================================================

/// Kind of user-facing feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

/// User-facing feedback produced by a store operation.
///
/// Stores never show UI themselves; the host decides how to present these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, title, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to audio playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// A track was loaded and started playing.
    Started {
        track_id: String,
        title: String,
        artist: String,
        cover: Option<String>,
        /// Where the media was loaded from (URL or path).
        locator: String,
    },
    Paused {
        track_id: String,
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    Resumed {
        track_id: String,
        position_ms: u64,
    },
    /// Playback was stopped and the track unloaded.
    Stopped { track_id: String },
    /// Track reached its end and nothing followed it.
    Completed { track_id: String },
    /// Playback position changed (seek or natural progression).
    PositionChanged {
        track_id: String,
        position_ms: u64,
        /// Track duration (milliseconds), 0 when unknown.
        duration_ms: u64,
    },
    /// The active queue was replaced.
    QueueChanged { length: usize, index: usize },
    /// The audio engine rejected an operation.
    Error {
        track_id: Option<String>,
        message: String,
    },
    /// Equalizer preset or band gains changed.
    EqualizerChanged { preset: String, is_custom: bool },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::QueueChanged { .. } => "Queue changed",
            PlaybackEvent::Error { .. } => "Playback error",
            PlaybackEvent::EqualizerChanged { .. } => "Equalizer changed",
        }
    }
}

// ============================================================================
// Library Events
// ============================================================================

/// Events related to playlists and play history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    PlaylistCreated {
        playlist_id: String,
        name: String,
    },
    /// Playlist renamed or re-described.
    PlaylistUpdated {
        playlist_id: String,
        /// What changed (e.g., "renamed", "description").
        change_type: String,
    },
    PlaylistDeleted { playlist_id: String },
    SongAdded {
        playlist_id: String,
        song_id: String,
    },
    SongRemoved {
        playlist_id: String,
        song_id: String,
        /// Number of entries removed.
        removed: usize,
    },
    PlayCountUpdated { song_id: String, play_count: u64 },
    PlayHistoryCleared,
    /// Downloaded files were re-listed from disk.
    DownloadsRefreshed { count: usize },
    DownloadProgress {
        item_id: String,
        /// Percent complete, 0 to 100.
        percent: u8,
    },
    DownloadCompleted { item_id: String },
    DownloadFailed { item_id: String, message: String },
    DownloadDeleted { filename: String },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::PlaylistCreated { .. } => "Playlist created",
            LibraryEvent::PlaylistUpdated { .. } => "Playlist updated",
            LibraryEvent::PlaylistDeleted { .. } => "Playlist deleted",
            LibraryEvent::SongAdded { .. } => "Song added to playlist",
            LibraryEvent::SongRemoved { .. } => "Song removed from playlist",
            LibraryEvent::PlayCountUpdated { .. } => "Play count updated",
            LibraryEvent::PlayHistoryCleared => "Play history cleared",
            LibraryEvent::DownloadsRefreshed { .. } => "Downloads refreshed",
            LibraryEvent::DownloadProgress { .. } => "Download progress",
            LibraryEvent::DownloadCompleted { .. } => "Download completed",
            LibraryEvent::DownloadFailed { .. } => "Download failed",
            LibraryEvent::DownloadDeleted { .. } => "Downloaded file deleted",
        }
    }
}

// ============================================================================
// Account Events
// ============================================================================

/// Events related to saved user credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AccountEvent {
    CredentialsSaved { username: String },
    /// Saved credentials were restored at startup.
    CredentialsLoaded { username: String },
    CredentialsCleared,
}

impl AccountEvent {
    fn description(&self) -> &str {
        match self {
            AccountEvent::CredentialsSaved { .. } => "Credentials saved",
            AccountEvent::CredentialsLoaded { .. } => "Credentials restored",
            AccountEvent::CredentialsCleared => "Credentials cleared",
        }
    }
}

// ============================================================================
// Device Events
// ============================================================================

/// Events related to the host device: companion apps and connectivity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DeviceEvent {
    /// Map overlay state changed.
    OverlayChanged {
        overlay_enabled: bool,
        overlay_visible: bool,
        maps_app_active: bool,
    },
    ConnectivityChanged {
        is_online: bool,
        /// Connection type label (e.g., "wifi", "cellular").
        connection_type: Option<String>,
    },
    OfflineModeChanged { enabled: bool },
    /// Device reconnected and pending offline work should be synchronized.
    SyncRequested,
}

impl DeviceEvent {
    fn description(&self) -> &str {
        match self {
            DeviceEvent::OverlayChanged { .. } => "Map overlay changed",
            DeviceEvent::ConnectivityChanged { .. } => "Connectivity changed",
            DeviceEvent::OfflineModeChanged { .. } => "Offline mode changed",
            DeviceEvent::SyncRequested => "Sync requested",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Publishes a notice, ignoring the absence of subscribers.
    pub fn notify(&self, notice: Notice) {
        let _ = self.sender.send(CoreEvent::Notice(notice));
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future events.
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let notices = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Notice(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events that match `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every matching event currently buffered.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
