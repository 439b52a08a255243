//! Event types for the PhotoSelect event system
//!
//! Provides shared event definitions and EventBus for all PhotoSelect modules.

// Sub-modules (supporting types)
mod curation_types;

// Re-export all types
pub use curation_types::{EmotionCountData, EmotionType};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// PhotoSelect event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All events use this central enum for type safety and
/// exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CurationEvent {
    /// A curation session started analyzing a photo batch
    ///
    /// Triggers:
    /// - SSE: Show progress UI
    CurationSessionStarted {
        /// Session UUID
        session_id: Uuid,
        /// Number of photos in the batch
        total_photos: usize,
        /// When the session started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One photo finished classification
    ///
    /// Emitted exactly once per completed photo, in batch order.
    /// `completed` increases monotonically from 1 to `total`.
    ///
    /// Triggers:
    /// - SSE: Advance progress bar
    PhotoClassified {
        /// Session UUID
        session_id: Uuid,
        /// Cumulative completed count (1-based)
        completed: usize,
        /// Total photos in the batch
        total: usize,
        /// When classification completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The whole batch finished analysis; session entered Reviewing
    ///
    /// Triggers:
    /// - SSE: Render the review screen (per-class counts)
    AnalysisCompleted {
        /// Session UUID
        session_id: Uuid,
        /// Total photos analyzed
        total: usize,
        /// Per-class counts (only classes with at least one photo)
        summaries: Vec<EmotionCountData>,
        /// When analysis completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The user changed the active classes or the extraction count
    ///
    /// Triggers:
    /// - SSE: Re-render filter chips and count stepper
    SelectionChanged {
        /// Session UUID
        session_id: Uuid,
        /// Currently active classes
        active_emotions: Vec<EmotionType>,
        /// Desired extraction count (already clamped)
        extract_count: usize,
        /// Upper bound for the extraction count
        max_extractable: usize,
        /// When the selection changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An extraction snapshot was frozen; session entered Extracted
    ///
    /// Triggers:
    /// - SSE: Render the final list
    ExtractionReady {
        /// Session UUID
        session_id: Uuid,
        /// Number of photos in the snapshot
        count: usize,
        /// When the snapshot was taken
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Saving extraction output to storage finished
    ///
    /// Partial failure is reported, never silently collapsed into success.
    SaveCompleted {
        /// Session UUID
        session_id: Uuid,
        /// Photos stored successfully
        succeeded: usize,
        /// Photos that failed to store
        failed: usize,
        /// When saving finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session was cancelled while analyzing
    CurationSessionCancelled {
        /// Session UUID
        session_id: Uuid,
        /// When cancellation took effect
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session failed with a critical error
    CurationSessionFailed {
        /// Session UUID
        session_id: Uuid,
        /// Error description
        error: String,
        /// When the failure occurred
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CurationEvent {
    /// Get the event type name for SSE transmission
    pub fn event_type(&self) -> &str {
        match self {
            CurationEvent::CurationSessionStarted { .. } => "CurationSessionStarted",
            CurationEvent::PhotoClassified { .. } => "PhotoClassified",
            CurationEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            CurationEvent::SelectionChanged { .. } => "SelectionChanged",
            CurationEvent::ExtractionReady { .. } => "ExtractionReady",
            CurationEvent::SaveCompleted { .. } => "SaveCompleted",
            CurationEvent::CurationSessionCancelled { .. } => "CurationSessionCancelled",
            CurationEvent::CurationSessionFailed { .. } => "CurationSessionFailed",
        }
    }
}

// ============================================================================
// EventBus Implementation
// ============================================================================

/// Event bus for broadcasting CurationEvents to all subscribers
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Multiple producers (any component can emit)
/// - Multiple consumers (SSE handlers, loggers, tests)
/// - Bounded buffering with oldest-event drop on overflow
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CurationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CurationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CurationEvent,
    ) -> Result<usize, broadcast::error::SendError<CurationEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Useful for non-critical events where it's acceptable if no component
    /// is currently listening (e.g. per-photo progress).
    pub fn emit_lossy(&self, event: CurationEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
