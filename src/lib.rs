mod bus;
mod client;
mod command;
mod config;
mod coordinator;
mod debounce;
mod diff;
mod entity;
mod error;
mod integration;
mod logger;
mod properties;
mod session;
mod types;

pub use bus::{DEFAULT_BUS_CAPACITY, DEVICE_UPDATED_TOPIC, DeviceEvent, EventBus, UpdateSource};
pub use client::CloudClient;
pub use command::ExecuteOutcome;
pub use config::{
    BridgeConfig, BridgeConfigBuilder, DEFAULT_COMPLETION_POLL_INTERVAL,
    DEFAULT_COMPLETION_TIMEOUT, DEFAULT_DEBOUNCE_DELAY, DEFAULT_FAN_DEBOUNCE_DELAY,
    DEFAULT_REFRESH_INTERVAL,
};
pub use coordinator::Coordinator;
pub use debounce::Debouncer;
pub use entity::*;
pub use error::{Error, Failure, Result, classify};
pub use integration::{Integration, validate_credentials};
pub use logger::MessageLogMode;
pub use properties::{FanDirection, OperationMode, PowerState, WindSpeed, parse_control_ids};
pub use session::{DEFAULT_REAUTH_INTERVAL, Session};
pub use types::*;

/// Property codes understood by the snapshot's typed accessors.
pub mod codes {
    pub use crate::properties::{
        FAN_DIRECTION, OPERATION_MODE, POWER, ROOM_TEMPERATURE, TARGET_TEMPERATURE, WINDSPEED,
    };
}
