//! Search event bus.
//!
//! Broadcast-based event distribution with sequence numbering. The search
//! core pushes typed events onto the channel; CLI or GUI layers subscribe
//! independently. Emission is fire-and-forget: a send with no subscribers is
//! not an error and never affects orchestration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Monotonically increasing sequence number assigned by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed payloads emitted during a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEventPayload {
    CandidateStarted {
        candidate_id: String,
        seed: u32,
    },
    CandidateCompleted {
        candidate_id: String,
        passed: bool,
        progress: f64,
    },
    BatchCompleted {
        batch: usize,
        completed: usize,
        total: usize,
        best_progress: f64,
    },
    RoundCompleted {
        round: usize,
        n: usize,
        any_passed: bool,
    },
    /// Streaming generation output for a candidate.
    OutputChunk {
        candidate_id: String,
        text: String,
    },
}

/// Event envelope with bus-assigned metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEvent {
    pub sequence: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub payload: SearchEventPayload,
}

/// Broadcast bus for search events.
pub struct SearchEventBus {
    tx: broadcast::Sender<SearchEvent>,
    sequence: AtomicU64,
}

impl SearchEventBus {
    /// Create a bus with the given subscriber buffer capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sequence: AtomicU64::new(0),
        }
    }

    /// Subscribe to all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. Fire-and-forget: lagging or absent subscribers never
    /// affect the sender.
    pub fn emit(&self, payload: SearchEventPayload) {
        let event = SearchEvent {
            sequence: SequenceNumber(self.sequence.fetch_add(1, Ordering::SeqCst)),
            timestamp: Utc::now(),
            payload,
        };
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SearchEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
