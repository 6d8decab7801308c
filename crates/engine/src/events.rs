//! Transient persistence notifications backed by `tokio::sync::broadcast`.
//!
//! The UI subscribes to show non-blocking toasts ("Layout saved", "Could not
//! save layout"). Nothing in the engine depends on anyone listening.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use x121_layout_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// LayoutEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutEventKind {
    Loaded {
        layout_id: DbId,
        layout_name: String,
    },
    LoadFailed {
        message: String,
    },
    Saved {
        layout_id: DbId,
        layout_name: String,
        created: bool,
    },
    SaveFailed {
        message: String,
        retryable: bool,
    },
    Deleted {
        layout_id: DbId,
    },
}

/// A persistence notification with the time it was raised.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutEvent {
    #[serde(flatten)]
    pub kind: LayoutEventKind,
    pub timestamp: Timestamp,
}

impl LayoutEvent {
    pub fn new(kind: LayoutEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// In-process fan-out of [`LayoutEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<LayoutEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers that fall behind observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers; dropped if nobody listens.
    pub fn publish(&self, kind: LayoutEventKind) {
        let _ = self.sender.send(LayoutEvent::new(kind));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LayoutEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
