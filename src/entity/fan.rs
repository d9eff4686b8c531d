use std::sync::Arc;

use tracing::info;

use super::{DeviceUpdates, Entity};
use crate::bus::DeviceEvent;
use crate::client::CloudClient;
use crate::command::ExecuteOutcome;
use crate::coordinator::Coordinator;
use crate::properties::{PowerState, WindSpeed};
use crate::types::{Device, DeviceInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanPreset {
    Auto,
    Normal,
}

impl FanPreset {
    pub const ALL: [FanPreset; 2] = [FanPreset::Auto, FanPreset::Normal];

    pub fn as_str(&self) -> &'static str {
        match self {
            FanPreset::Auto => "Auto",
            FanPreset::Normal => "Normal",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "Auto" => Some(FanPreset::Auto),
            "Normal" => Some(FanPreset::Normal),
            _ => None,
        }
    }
}

/// Speed level (1..=8) for a percentage in 1..=100.
fn percentage_to_level(percentage: u8) -> u8 {
    let pct = u32::from(percentage.min(100));
    let levels = u32::from(WindSpeed::MAX_LEVEL);
    // ceil(pct * levels / 100)
    let level = (pct * levels).div_ceil(100);
    level.clamp(1, levels) as u8
}

fn level_to_percentage(level: u8) -> u8 {
    (u32::from(level) * 100 / u32::from(WindSpeed::MAX_LEVEL)) as u8
}

/// The indoor unit's blower as a fan entity.
pub struct FanEntity<C> {
    coordinator: Coordinator<C>,
}

impl<C: CloudClient> FanEntity<C> {
    pub fn new(coordinator: Coordinator<C>) -> Self {
        Self { coordinator }
    }

    fn device(&self) -> Arc<Device> {
        self.coordinator.device()
    }

    pub fn updates(&self) -> DeviceUpdates {
        DeviceUpdates::new(&self.coordinator)
    }

    pub fn speed_count(&self) -> u8 {
        WindSpeed::MAX_LEVEL
    }

    pub fn is_on(&self) -> bool {
        self.device().power() == Some(PowerState::On)
    }

    /// Current speed as a percentage. Automatic speed reports 100.
    pub fn percentage(&self) -> Option<u8> {
        match self.device().windspeed()? {
            WindSpeed::Auto => Some(100),
            WindSpeed::Level(n) => Some(level_to_percentage(n)),
        }
    }

    pub fn preset_modes(&self) -> &'static [FanPreset] {
        &FanPreset::ALL
    }

    pub fn preset_mode(&self) -> FanPreset {
        match self.device().windspeed() {
            Some(WindSpeed::Auto) => FanPreset::Auto,
            _ => FanPreset::Normal,
        }
    }

    async fn execute(&self, device: &Device) -> ExecuteOutcome {
        self.coordinator
            .execute_and_refresh_with(device, self.coordinator.config().fan_debounce_delay)
            .await
    }

    pub async fn set_percentage(&self, percentage: u8) -> ExecuteOutcome {
        info!(percentage, "setting fan speed");
        if percentage == 0 {
            return self.turn_off().await;
        }
        let device = self.device();
        device.queue_windspeed(WindSpeed::Level(percentage_to_level(percentage)));
        device.queue_power(PowerState::On);
        self.execute(&device).await
    }

    pub async fn set_preset_mode(&self, preset: FanPreset) -> ExecuteOutcome {
        info!(preset = preset.as_str(), "setting fan preset");
        let speed = match preset {
            FanPreset::Auto => WindSpeed::Auto,
            FanPreset::Normal => WindSpeed::Level(4),
        };
        let device = self.device();
        device.queue_windspeed(speed);
        self.execute(&device).await
    }

    pub async fn turn_on(&self) -> ExecuteOutcome {
        info!("turning fan on");
        let device = self.device();
        device.queue_power(PowerState::On);
        if let Some(mode) = device.operation_mode() {
            device.queue_operation_mode(mode);
        }
        self.execute(&device).await
    }

    pub async fn turn_off(&self) -> ExecuteOutcome {
        info!("turning fan off");
        let device = self.device();
        device.queue_power(PowerState::Off);
        self.execute(&device).await
    }
}

impl<C: CloudClient> Entity for FanEntity<C> {
    fn unique_id(&self) -> String {
        format!("{}_fan", self.coordinator.device_id())
    }

    fn name(&self) -> String {
        format!("{} Fan", self.device().name())
    }

    fn device_info(&self) -> DeviceInfo {
        self.device().info().clone()
    }

    fn handles(&self, event: &DeviceEvent) -> bool {
        event.device_id == self.coordinator.device_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_maps_to_levels() {
        assert_eq!(percentage_to_level(1), 1);
        assert_eq!(percentage_to_level(12), 1);
        assert_eq!(percentage_to_level(13), 2);
        assert_eq!(percentage_to_level(50), 4);
        assert_eq!(percentage_to_level(51), 5);
        assert_eq!(percentage_to_level(100), 8);
        assert_eq!(percentage_to_level(250), 8);
    }

    #[test]
    fn levels_map_to_percentage() {
        assert_eq!(level_to_percentage(1), 12);
        assert_eq!(level_to_percentage(4), 50);
        assert_eq!(level_to_percentage(8), 100);
    }

    #[test]
    fn preset_names() {
        for preset in FanPreset::ALL {
            assert_eq!(FanPreset::from_label(preset.as_str()), Some(preset));
        }
        assert_eq!(FanPreset::from_label("Turbo"), None);
    }
}
