//! # Event Bus System
//!
//! Provides an event-driven architecture for the reconciliation engine using
//! `tokio::sync::broadcast`. This module enables decoupled communication
//! between the engine and its hosts through typed events.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for each domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     emit      ┌───────────┐
//! │ ReconcileService ├──────────────>│           │
//! └──────────────────┘               │ EventBus  │     subscribe    ┌────────────┐
//!                                    │ (broadcast├─────────────────>│ Subscriber │
//! ┌──────────────────┐     emit      │  channel) │                  └────────────┘
//! │ BatchJob         ├──────────────>│           │
//! └──────────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ### Publishing Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, BatchEvent};
//!
//! let event_bus = EventBus::new(100);
//! let event = CoreEvent::Batch(BatchEvent::Started { total: 12 });
//!
//! event_bus.emit(event).ok();
//! ```
//!
//! ### Subscribing to Events
//!
//! ```no_run
//! use core_runtime::events::{EventBus, CoreEvent};
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match stream.recv().await {
//!             Ok(event) => println!("Received: {:?}", event),
//!             Err(RecvError::Lagged(n)) => {
//!                 eprintln!("Missed {} events", n);
//!             }
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The event bus uses `tokio::sync::broadcast`, which can produce two kinds
//! of receive errors:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; the subscriber keeps receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. Shutdown signal.
//!
//! Event delivery is best-effort notification: the engine never blocks on a
//! slow subscriber, and outcomes are returned through the service API rather
//! than through events.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event bus.
/// It wraps domain-specific event types for different modules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Single-file reconciliation events
    Reconcile(ReconcileEvent),
    /// Batch pipeline events
    Batch(BatchEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Reconcile(e) => e.description(),
            CoreEvent::Batch(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Batch(BatchEvent::ItemCompleted { outcome, .. }) => match outcome.as_str() {
                "failed" | "error" => EventSeverity::Warning,
                _ => EventSeverity::Info,
            },
            CoreEvent::Batch(BatchEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Batch(BatchEvent::Completed { .. }) => EventSeverity::Info,
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
// Reconcile Events
// ============================================================================

/// Events emitted while reconciling a single file interactively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ReconcileEvent {
    /// Catalog search issued for a local track.
    SearchStarted {
        /// Title used in the query.
        title: String,
        /// Artist used in the query.
        artist: String,
    },
    /// Catalog search returned (possibly empty) candidates.
    SearchCompleted {
        /// Number of candidates after ranking and capping.
        candidates: usize,
    },
    /// A candidate was scored against the local track.
    CandidateScored {
        /// Remote identifier of the candidate.
        catalog_id: String,
        /// Weighted confidence total (0-100).
        total: u8,
    },
}

impl ReconcileEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            ReconcileEvent::SearchStarted { .. } => "Catalog search started",
            ReconcileEvent::SearchCompleted { .. } => "Catalog search completed",
            ReconcileEvent::CandidateScored { .. } => "Candidate scored",
        }
    }
}

// ============================================================================
// Batch Events
// ============================================================================

/// Pipeline phase of one file inside a batch run.
///
/// Every file moves through these phases in order and ends in `Terminal`;
/// the terminal outcome itself is carried by `BatchEvent::ItemCompleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemPhase {
    /// Enqueued, waiting for a worker slot.
    Pending,
    /// Reading local tags and querying the catalog.
    Fetching,
    /// Ordering candidates by duration proximity.
    Ranking,
    /// Scoring the top-ranked candidate.
    Scoring,
    /// Applying the threshold decision.
    Deciding,
    /// Reached a terminal outcome.
    Terminal,
}

impl fmt::Display for ItemPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ItemPhase::Pending => "pending",
            ItemPhase::Fetching => "fetching",
            ItemPhase::Ranking => "ranking",
            ItemPhase::Scoring => "scoring",
            ItemPhase::Deciding => "deciding",
            ItemPhase::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Events emitted by the batch pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BatchEvent {
    /// Batch run started.
    Started {
        /// Number of files submitted.
        total: usize,
    },
    /// One file moved to a new pipeline phase.
    ItemStateChanged {
        /// File being processed (display form of the path).
        file: String,
        /// New phase.
        phase: ItemPhase,
    },
    /// One file reached its terminal outcome.
    ItemCompleted {
        /// File that completed.
        file: String,
        /// Outcome label ("updated", "skipped", "no_match", "failed", "error").
        outcome: String,
        /// Confidence score, when the outcome carries one.
        score: Option<u8>,
    },
    /// Batch run finished; every submitted file has an outcome.
    Completed {
        /// Files processed (always equals the submitted total).
        processed: usize,
        /// Files updated.
        updated: usize,
        /// Files skipped below the threshold.
        skipped: usize,
        /// Files with no catalog match.
        no_match: usize,
        /// Files where the update write failed.
        failed: usize,
        /// Files that errored before a decision.
        errored: usize,
    },
}

impl BatchEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            BatchEvent::Started { .. } => "Batch started",
            BatchEvent::ItemStateChanged { .. } => "Batch item phase changed",
            BatchEvent::ItemCompleted { .. } => "Batch item completed",
            BatchEvent::Completed { .. } => "Batch completed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for broadcasting engine events to subscribers.
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
    /// Returns the number of subscribers that received the event.
    /// Returns an error if there are no active subscribers; callers that
    /// treat events as optional notification should ignore it.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
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

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(CoreEvent::Batch(BatchEvent::Started { total: 3 }))
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event, CoreEvent::Batch(BatchEvent::Started { total: 3 }));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(CoreEvent::Reconcile(ReconcileEvent::SearchCompleted {
            candidates: 5,
        }))
        .unwrap();

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(16);
        let result = bus.emit(CoreEvent::Batch(BatchEvent::Started { total: 1 }));
        assert!(result.is_err());
    }

    #[test]
    fn test_severity() {
        let warn = CoreEvent::Batch(BatchEvent::ItemCompleted {
            file: "a.mp3".to_string(),
            outcome: "error".to_string(),
            score: None,
        });
        assert_eq!(warn.severity(), EventSeverity::Warning);

        let info = CoreEvent::Batch(BatchEvent::ItemCompleted {
            file: "a.mp3".to_string(),
            outcome: "updated".to_string(),
            score: Some(92),
        });
        assert_eq!(info.severity(), EventSeverity::Info);

        let debug = CoreEvent::Batch(BatchEvent::ItemStateChanged {
            file: "a.mp3".to_string(),
            phase: ItemPhase::Ranking,
        });
        assert_eq!(debug.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_item_phase_display() {
        assert_eq!(ItemPhase::Fetching.to_string(), "fetching");
        assert_eq!(ItemPhase::Terminal.to_string(), "terminal");
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = CoreEvent::Batch(BatchEvent::ItemCompleted {
            file: "track.flac".to_string(),
            outcome: "skipped".to_string(),
            score: Some(70),
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
