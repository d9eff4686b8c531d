use std::sync::Arc;

use tracing::{error, info};

use super::{DeviceUpdates, Entity};
use crate::bus::DeviceEvent;
use crate::client::CloudClient;
use crate::command::ExecuteOutcome;
use crate::coordinator::Coordinator;
use crate::properties::{self, FanDirection, OperationMode, PowerState, WindSpeed};
use crate::types::{Device, DeviceInfo};
use crate::{Error, Result};

pub const TARGET_TEMPERATURE_STEP: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Off,
    Cool,
    Heat,
    Dry,
    Auto,
    FanOnly,
}

impl HvacMode {
    pub const ALL: [HvacMode; 6] = [
        HvacMode::Off,
        HvacMode::Cool,
        HvacMode::Heat,
        HvacMode::Dry,
        HvacMode::Auto,
        HvacMode::FanOnly,
    ];

    fn operation_mode(self) -> Option<OperationMode> {
        match self {
            HvacMode::Off => None,
            HvacMode::Cool => Some(OperationMode::Cool),
            HvacMode::Heat => Some(OperationMode::Heat),
            HvacMode::Dry => Some(OperationMode::Dehumidify),
            HvacMode::Auto => Some(OperationMode::Auto),
            HvacMode::FanOnly => Some(OperationMode::Ventilation),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacAction {
    Off,
    Heating,
    Cooling,
    Drying,
    Fan,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanMode {
    Auto,
    Low,
    Medium,
    High,
}

impl FanMode {
    pub const ALL: [FanMode; 4] = [FanMode::Low, FanMode::Medium, FanMode::High, FanMode::Auto];

    pub fn as_str(&self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::Low => "low",
            FanMode::Medium => "medium",
            FanMode::High => "high",
        }
    }

    pub fn from_windspeed(speed: WindSpeed) -> Self {
        match speed {
            WindSpeed::Auto => FanMode::Auto,
            WindSpeed::Level(1..=2) => FanMode::Low,
            WindSpeed::Level(3..=5) => FanMode::Medium,
            WindSpeed::Level(_) => FanMode::High,
        }
    }

    pub fn windspeed(self) -> WindSpeed {
        match self {
            FanMode::Auto => WindSpeed::Auto,
            FanMode::Low => WindSpeed::Level(1),
            FanMode::Medium => WindSpeed::Level(4),
            FanMode::High => WindSpeed::Level(8),
        }
    }
}

/// Swing mode labels, in the order they are offered.
pub const SWING_MODES: [(FanDirection, &str); 7] = [
    (FanDirection::Auto, "Auto"),
    (FanDirection::Position(1), "Top"),
    (FanDirection::Position(2), "High"),
    (FanDirection::Position(3), "Middle"),
    (FanDirection::Position(4), "Low"),
    (FanDirection::Position(5), "Bottom"),
    (FanDirection::Swing, "Swing"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateFeatures(u8);

impl ClimateFeatures {
    pub const TARGET_TEMPERATURE: Self = Self(1);
    pub const FAN_MODE: Self = Self(1 << 1);
    pub const SWING_MODE: Self = Self(1 << 2);
    pub const TURN_ON: Self = Self(1 << 3);
    pub const TURN_OFF: Self = Self(1 << 4);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

const FEATURES_NO_TEMPERATURE: ClimateFeatures = ClimateFeatures::FAN_MODE
    .union(ClimateFeatures::SWING_MODE)
    .union(ClimateFeatures::TURN_ON)
    .union(ClimateFeatures::TURN_OFF);

const FEATURES: ClimateFeatures = FEATURES_NO_TEMPERATURE.union(ClimateFeatures::TARGET_TEMPERATURE);

fn round_to_step(celsius: f64) -> f64 {
    (celsius / TARGET_TEMPERATURE_STEP).round() * TARGET_TEMPERATURE_STEP
}

/// Air conditioner as a thermostat-style climate entity.
pub struct ClimateEntity<C> {
    coordinator: Coordinator<C>,
}

impl<C: CloudClient> ClimateEntity<C> {
    pub fn new(coordinator: Coordinator<C>) -> Self {
        Self { coordinator }
    }

    fn device(&self) -> Arc<Device> {
        self.coordinator.device()
    }

    pub fn updates(&self) -> DeviceUpdates {
        DeviceUpdates::new(&self.coordinator)
    }

    pub fn supported_features(&self) -> ClimateFeatures {
        match self.device().operation_mode() {
            Some(OperationMode::Auto | OperationMode::Dehumidify | OperationMode::Ventilation) => {
                FEATURES_NO_TEMPERATURE
            }
            _ => FEATURES,
        }
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &HvacMode::ALL
    }

    pub fn hvac_mode(&self) -> HvacMode {
        let device = self.device();
        if device.power() == Some(PowerState::Off) {
            return HvacMode::Off;
        }
        match device.operation_mode() {
            Some(OperationMode::Heat) => HvacMode::Heat,
            Some(OperationMode::Cool) => HvacMode::Cool,
            Some(OperationMode::Dehumidify) => HvacMode::Dry,
            Some(OperationMode::Ventilation) => HvacMode::FanOnly,
            _ => HvacMode::Auto,
        }
    }

    pub fn hvac_action(&self) -> HvacAction {
        let device = self.device();
        if device.power() == Some(PowerState::Off) {
            return HvacAction::Off;
        }
        match device.operation_mode() {
            Some(OperationMode::Heat) => HvacAction::Heating,
            Some(OperationMode::Cool) => HvacAction::Cooling,
            Some(OperationMode::Dehumidify) => HvacAction::Drying,
            Some(OperationMode::Ventilation | OperationMode::Other) => HvacAction::Fan,
            Some(OperationMode::Auto) => HvacAction::Idle,
            None => HvacAction::Off,
        }
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.device().room_temperature()
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.device().target_temperature()
    }

    pub fn fan_modes(&self) -> &'static [FanMode] {
        &FanMode::ALL
    }

    pub fn fan_mode(&self) -> FanMode {
        self.device()
            .windspeed()
            .map(FanMode::from_windspeed)
            .unwrap_or(FanMode::Auto)
    }

    pub fn swing_modes(&self) -> Vec<&'static str> {
        SWING_MODES.iter().map(|(_, label)| *label).collect()
    }

    pub fn swing_mode(&self) -> &'static str {
        let direction = self.device().fan_direction();
        SWING_MODES
            .iter()
            .find(|(d, _)| Some(*d) == direction)
            .map(|(_, label)| *label)
            .unwrap_or("Auto")
    }

    async fn execute(&self, device: &Device) -> ExecuteOutcome {
        self.coordinator.execute_and_refresh(device).await
    }

    /// Re-send the current operation mode so the unit comes back in it.
    fn requeue_operation_mode(device: &Device) {
        if let Some(mode) = device.operation_mode() {
            device.queue_operation_mode(mode);
        }
    }

    pub async fn set_temperature(&self, celsius: f64) -> ExecuteOutcome {
        let celsius = round_to_step(celsius);
        info!(celsius, "setting target temperature");
        let device = self.device();
        device.queue_temperature(celsius);
        device.queue_power(PowerState::On);
        Self::requeue_operation_mode(&device);
        self.execute(&device).await
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> ExecuteOutcome {
        info!(mode = ?mode, "setting HVAC mode");
        let device = self.device();
        match mode.operation_mode() {
            Some(op) => {
                device.queue_power(PowerState::On);
                if let Some(t) = device.target_temperature() {
                    device.queue_temperature(t);
                }
                device.queue_operation_mode(op);
            }
            None => device.queue_power(PowerState::Off),
        }
        self.execute(&device).await
    }

    pub async fn set_fan_mode(&self, mode: FanMode) -> ExecuteOutcome {
        info!(mode = mode.as_str(), "setting fan mode");
        let device = self.device();
        device.queue_windspeed(mode.windspeed());
        self.execute(&device).await
    }

    pub async fn set_swing_mode(&self, label: &str) -> Result<ExecuteOutcome> {
        info!(label, "setting swing mode");
        let Some((direction, _)) = SWING_MODES.iter().find(|(_, l)| *l == label) else {
            error!(label, "invalid swing mode");
            return Err(Error::InvalidValue {
                code: properties::FAN_DIRECTION,
                value: label.to_string(),
            });
        };
        let device = self.device();
        device.queue_fan_direction(*direction);
        Ok(self.execute(&device).await)
    }

    pub async fn turn_on(&self) -> ExecuteOutcome {
        info!("turning on");
        let device = self.device();
        device.queue_power(PowerState::On);
        if let Some(t) = device.target_temperature() {
            device.queue_temperature(t);
        }
        Self::requeue_operation_mode(&device);
        self.execute(&device).await
    }

    pub async fn turn_off(&self) -> ExecuteOutcome {
        info!("turning off");
        let device = self.device();
        device.queue_power(PowerState::Off);
        self.execute(&device).await
    }
}

impl<C: CloudClient> Entity for ClimateEntity<C> {
    fn unique_id(&self) -> String {
        self.coordinator.device_id().to_string()
    }

    fn name(&self) -> String {
        self.device().name().to_string()
    }

    fn device_info(&self) -> DeviceInfo {
        self.device().info().clone()
    }

    fn handles(&self, event: &DeviceEvent) -> bool {
        event.device_id == self.coordinator.device_id()
    }
}
