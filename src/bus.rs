//! In-process publish/subscribe bus for device update notifications.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use uuid::Uuid;

pub const DEVICE_UPDATED_TOPIC: &str = "cocoro.device_updated";

pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Why a device update was announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    /// A fresh snapshot was fetched from the cloud.
    Refreshed,
    /// A write was accepted; the snapshot holds the requested values.
    Optimistic,
}

#[derive(Debug, Clone)]
pub struct DeviceEvent {
    pub id: Uuid,
    pub device_id: String,
    pub source: UpdateSource,
    /// Property codes whose value differs from the previous snapshot.
    pub changes: Vec<String>,
    pub at: DateTime<Utc>,
}

impl DeviceEvent {
    pub fn new(device_id: impl Into<String>, source: UpdateSource, changes: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            device_id: device_id.into(),
            source,
            changes,
            at: Utc::now(),
        }
    }

    pub fn topic(&self) -> &'static str {
        DEVICE_UPDATED_TOPIC
    }

    pub fn payload(&self) -> Value {
        json!({ "device_id": self.device_id })
    }
}

/// Broadcast bus backed by a tokio [`broadcast`] channel.
///
/// Publishing succeeds with no subscribers; the event is dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: DeviceEvent) {
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
