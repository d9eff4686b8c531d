use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::properties::{self, FanDirection, OperationMode, PowerState, WindSpeed};

/// Account credentials issued by the vendor cloud.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub app_key: String,
    pub app_secret: String,
}

impl Credentials {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_secret: app_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

/// Immutable descriptive fields of a device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub name: String,
    pub maker: String,
    pub model: String,
    pub serial_number: String,
}

/// A property write waiting to be sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyUpdate {
    pub code: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
struct DeviceState {
    properties: BTreeMap<String, Value>,
    pending: Vec<PropertyUpdate>,
}

/// Last known state of one remote device.
///
/// Queuing an update writes the value into the property map immediately,
/// so readers see the requested state before the server confirms it.
#[derive(Debug)]
pub struct Device {
    info: DeviceInfo,
    state: Mutex<DeviceState>,
}

impl Device {
    pub fn new(info: DeviceInfo, properties: BTreeMap<String, Value>) -> Self {
        Self {
            info,
            state: Mutex::new(DeviceState {
                properties,
                pending: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn device_id(&self) -> &str {
        &self.info.device_id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn property(&self, code: &str) -> Option<Value> {
        self.lock().properties.get(code).cloned()
    }

    pub fn properties(&self) -> BTreeMap<String, Value> {
        self.lock().properties.clone()
    }

    fn property_str(&self, code: &str) -> Option<String> {
        self.lock()
            .properties
            .get(code)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn property_f64(&self, code: &str) -> Option<f64> {
        self.lock().properties.get(code).and_then(|v| v.as_f64())
    }

    pub fn power(&self) -> Option<PowerState> {
        self.property_str(properties::POWER)
            .and_then(|s| PowerState::from_vendor_str(&s))
    }

    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.property_str(properties::OPERATION_MODE)
            .and_then(|s| OperationMode::from_vendor_str(&s))
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.property_f64(properties::TARGET_TEMPERATURE)
    }

    pub fn room_temperature(&self) -> Option<f64> {
        self.property_f64(properties::ROOM_TEMPERATURE)
    }

    pub fn windspeed(&self) -> Option<WindSpeed> {
        self.property_str(properties::WINDSPEED)
            .and_then(|s| WindSpeed::from_vendor_str(&s))
    }

    pub fn fan_direction(&self) -> Option<FanDirection> {
        self.property_str(properties::FAN_DIRECTION)
            .and_then(|s| FanDirection::from_vendor_str(&s))
    }

    /// Queue a raw property write. A later write to the same code replaces
    /// the earlier one in the queue.
    pub fn queue_update(&self, code: &str, value: Value) {
        let mut state = self.lock();
        state.properties.insert(code.to_string(), value.clone());
        match state.pending.iter_mut().find(|u| u.code == code) {
            Some(existing) => existing.value = value,
            None => state.pending.push(PropertyUpdate {
                code: code.to_string(),
                value,
            }),
        }
    }

    pub fn queue_power(&self, power: PowerState) {
        self.queue_update(properties::POWER, Value::from(power.as_vendor_str()));
    }

    pub fn queue_operation_mode(&self, mode: OperationMode) {
        self.queue_update(properties::OPERATION_MODE, Value::from(mode.as_vendor_str()));
    }

    pub fn queue_temperature(&self, celsius: f64) {
        self.queue_update(properties::TARGET_TEMPERATURE, Value::from(celsius));
    }

    pub fn queue_windspeed(&self, speed: WindSpeed) {
        self.queue_update(properties::WINDSPEED, Value::from(speed.as_vendor_str()));
    }

    pub fn queue_fan_direction(&self, direction: FanDirection) {
        self.queue_update(
            properties::FAN_DIRECTION,
            Value::from(direction.as_vendor_str()),
        );
    }

    pub fn pending_updates(&self) -> Vec<PropertyUpdate> {
        self.lock().pending.clone()
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    pub fn clear_pending_updates(&self) {
        self.lock().pending.clear();
    }
}

impl Clone for Device {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            state: Mutex::new(self.lock().clone()),
        }
    }
}

/// Outcome of sending queued updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlResult {
    pub control_ids: Vec<String>,
}

impl ControlResult {
    pub fn from_response(response: &Value) -> Self {
        Self {
            control_ids: properties::parse_control_ids(response),
        }
    }
}

/// Server-side confirmation that controls finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlCompletion {
    pub completed: Vec<String>,
}
