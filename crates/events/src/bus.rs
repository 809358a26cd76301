//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Shared via `Arc<EventBus>` between the pipeline (publisher) and the
//! WebSocket handler (subscriber).

use chrono::{DateTime, Utc};
use layerforge_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PipelineEvent
// ---------------------------------------------------------------------------

/// A change to an asset pack or one of its pipeline jobs.
///
/// Carries enough for a dashboard to decide what to refetch; the row
/// itself travels in `payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// Dot-separated event name, see `layerforge_core::job_events`.
    pub event_type: String,

    pub asset_pack_id: DbId,

    /// Set for job events, `None` for pack events.
    pub job_id: Option<DbId>,

    /// Serialized row or event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    pub fn new(event_type: impl Into<String>, asset_pack_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            asset_pack_id,
            job_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_job(mut self, job_id: DbId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Every subscriber independently receives every published event. Slow
/// receivers that fall more than `capacity` events behind observe
/// `RecvError::Lagged` and skip ahead.
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped when nobody listens.
    pub fn publish(&self, event: PipelineEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
