//! # Event Bus System
//!
//! Event-driven communication between the download core and its host UI,
//! built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The orchestrator publishes typed events as pipelines progress; the host
//! subscribes to drive its job list, downloaded checkmarks, and error
//! notices without polling core state.
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Orchestrator ├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Host UI    │
//! ┌──────────────┐     emit      │ (broadcast│                  └────────────┘
//! │ Handoff path ├──────────────>│  channel) ├─────────────────> notifications
//! └──────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, DownloadEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Download(DownloadEvent::Queued {
//!     folder_id: "folder-123".to_string(),
//!     title: "Some Song".to_string(),
//! })).ok();
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` produces two receive errors: `Lagged(n)` when a
//! slow subscriber missed `n` events (non-fatal, keep receiving) and
//! `Closed` when every sender is gone (treat as shutdown).

use bridge_traits::export::ExportStatus;
use serde::{Deserialize, Serialize};
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
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Download pipeline events
    Download(DownloadEvent),
    /// Archive handoff events
    Handoff(HandoffEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Download(e) => e.description(),
            CoreEvent::Handoff(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Download(DownloadEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Download(DownloadEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Download(DownloadEvent::BatchFlushed { .. }) => EventSeverity::Info,
            CoreEvent::Handoff(HandoffEvent::SharedFallback { .. }) => EventSeverity::Warning,
            CoreEvent::Handoff(HandoffEvent::Dropped { .. }) => EventSeverity::Warning,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Download Events
// ============================================================================

/// Events emitted by the download orchestrator as pipelines progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum DownloadEvent {
    /// A download request was accepted and an export is being started.
    Queued {
        /// Folder key of the requested song.
        folder_id: String,
        /// Display title.
        title: String,
    },
    /// The remote export reported progress.
    Progress {
        /// Folder key of the song.
        folder_id: String,
        /// Remote job status after the latest poll.
        status: ExportStatus,
        /// Progress percentage, when reported.
        percent_done: Option<f32>,
    },
    /// The archive was fetched and persisted locally.
    Completed {
        /// Folder key of the song.
        folder_id: String,
        /// Local path of the persisted archive.
        path: String,
    },
    /// The pipeline failed; sibling downloads are unaffected.
    Failed {
        /// Folder key of the song.
        folder_id: String,
        /// Human-readable failure reason.
        message: String,
        /// Whether the failure was the archive-fetch timeout. Hosts report
        /// this case distinctly.
        timed_out: bool,
    },
    /// Every pipeline of the batch finished and the buffer was handed off.
    BatchFlushed {
        /// Number of archives in the flushed batch.
        count: usize,
    },
}

impl DownloadEvent {
    fn description(&self) -> &str {
        match self {
            DownloadEvent::Queued { .. } => "Download queued",
            DownloadEvent::Progress { .. } => "Export in progress",
            DownloadEvent::Completed { .. } => "Download completed",
            DownloadEvent::Failed { .. } => "Download failed",
            DownloadEvent::BatchFlushed { .. } => "Batch handed off",
        }
    }
}

// ============================================================================
// Handoff Events
// ============================================================================

/// Events emitted around companion-app delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum HandoffEvent {
    /// An archive was handed to the platform.
    Delivered {
        /// Local path of the delivered archive.
        path: String,
        /// Display title.
        title: String,
    },
    /// A delivery attempt was dropped because one is already outstanding.
    Dropped {
        /// Local path of the archive that was not delivered.
        path: String,
    },
    /// Direct delivery failed; the generic share action was offered instead.
    SharedFallback {
        /// Local path of the archive.
        path: String,
        /// Why direct delivery failed.
        reason: String,
    },
}

impl HandoffEvent {
    fn description(&self) -> &str {
        match self {
            HandoffEvent::Delivered { .. } => "Archive delivered",
            HandoffEvent::Dropped { .. } => "Handoff dropped (already outstanding)",
            HandoffEvent::SharedFallback { .. } => "Fell back to share action",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally: multiple producers (clone the
/// `EventBus`), multiple consumers (each `subscribe()` creates a new
/// receiver), non-blocking sends, and lagging detection for slow consumers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none. Emitters treat that error as ignorable: a
    /// headless core without a UI attached is a valid state.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued(folder_id: &str) -> CoreEvent {
        CoreEvent::Download(DownloadEvent::Queued {
            folder_id: folder_id.to_string(),
            title: "Song".to_string(),
        })
    }

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit(queued("f1")).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event, queued("f1"));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(queued("f1")).unwrap();

        assert_eq!(rx1.recv().await.unwrap(), queued("f1"));
        assert_eq!(rx2.recv().await.unwrap(), queued("f1"));
    }

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        assert!(bus.emit(queued("f1")).is_err());
    }

    #[test]
    fn test_severity_mapping() {
        let failed = CoreEvent::Download(DownloadEvent::Failed {
            folder_id: "f1".to_string(),
            message: "boom".to_string(),
            timed_out: false,
        });
        assert_eq!(failed.severity(), EventSeverity::Error);
        assert_eq!(queued("f1").severity(), EventSeverity::Debug);

        let dropped = CoreEvent::Handoff(HandoffEvent::Dropped {
            path: "/tmp/a.adx".to_string(),
        });
        assert_eq!(dropped.severity(), EventSeverity::Warning);
    }

    #[test]
    fn test_event_serialization() {
        let event = CoreEvent::Download(DownloadEvent::Progress {
            folder_id: "f1".to_string(),
            status: ExportStatus::InProgress,
            percent_done: Some(42.5),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"IN_PROGRESS\""));

        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
