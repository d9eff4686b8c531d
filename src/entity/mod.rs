//! Entities exposed to the automation hub.
//!
//! Entities never keep their own copy of the device; every read goes
//! through [`Coordinator::device`] so a replaced snapshot is picked up
//! immediately.

mod climate;
mod fan;
mod sensor;

pub use climate::{ClimateEntity, ClimateFeatures, FanMode, HvacAction, HvacMode, SWING_MODES};
pub use fan::{FanEntity, FanPreset};
pub use sensor::TemperatureSensor;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::bus::DeviceEvent;
use crate::client::CloudClient;
use crate::coordinator::Coordinator;
use crate::types::DeviceInfo;

pub trait Entity {
    fn unique_id(&self) -> String;
    fn name(&self) -> String;
    fn device_info(&self) -> DeviceInfo;

    /// Whether `event` concerns this entity's device.
    fn handles(&self, event: &DeviceEvent) -> bool;
}

/// Update events for one device.
pub struct DeviceUpdates {
    rx: broadcast::Receiver<DeviceEvent>,
    device_id: String,
}

impl DeviceUpdates {
    pub(crate) fn new<C: CloudClient>(coordinator: &Coordinator<C>) -> Self {
        Self {
            rx: coordinator.bus().subscribe(),
            device_id: coordinator.device_id().to_string(),
        }
    }

    /// Wait for the next event for this device. `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<DeviceEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.device_id == self.device_id => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Entities re-read the whole snapshot, so missed events
                    // only matter for the change list.
                    warn!(skipped, "device update receiver lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
