use super::{DeviceUpdates, Entity};
use crate::bus::DeviceEvent;
use crate::client::CloudClient;
use crate::coordinator::Coordinator;
use crate::types::DeviceInfo;

pub const TEMPERATURE_UNIT: &str = "\u{00b0}C";
pub const DISPLAY_PRECISION: f64 = 0.1;

/// Room temperature reported by the indoor unit.
pub struct TemperatureSensor<C> {
    coordinator: Coordinator<C>,
}

impl<C: CloudClient> TemperatureSensor<C> {
    pub fn new(coordinator: Coordinator<C>) -> Self {
        Self { coordinator }
    }

    pub fn updates(&self) -> DeviceUpdates {
        DeviceUpdates::new(&self.coordinator)
    }

    pub fn native_value(&self) -> Option<f64> {
        self.coordinator.device().room_temperature()
    }

    pub fn unit(&self) -> &'static str {
        TEMPERATURE_UNIT
    }
}

impl<C: CloudClient> Entity for TemperatureSensor<C> {
    fn unique_id(&self) -> String {
        format!("{}_temperature", self.coordinator.device_id())
    }

    fn name(&self) -> String {
        format!("{} Temperature", self.coordinator.device().name())
    }

    fn device_info(&self) -> DeviceInfo {
        self.coordinator.device().info().clone()
    }

    fn handles(&self, event: &DeviceEvent) -> bool {
        event.device_id == self.coordinator.device_id()
    }
}
