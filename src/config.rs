use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::bus::DEFAULT_BUS_CAPACITY;
use crate::logger::MessageLogMode;
use crate::session::DEFAULT_REAUTH_INTERVAL;
use crate::types::Credentials;
use crate::{Error, Result};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_FAN_DEBOUNCE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_COMPLETION_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub credentials: Credentials,
    /// Device to mirror. `None` picks the first device the account reports.
    pub device_id: Option<String>,
    pub refresh_interval: Duration,
    pub reauth_interval: Duration,
    pub debounce_delay: Duration,
    pub fan_debounce_delay: Duration,
    pub completion_timeout: Duration,
    pub completion_poll_interval: Duration,
    pub bus_capacity: usize,
    pub message_log: Option<(MessageLogMode, PathBuf)>,
}

impl BridgeConfig {
    pub fn builder(credentials: Credentials) -> BridgeConfigBuilder {
        BridgeConfigBuilder::new(credentials)
    }

    /// Parse the data object stored by the setup flow.
    ///
    /// `app_key` and `app_secret` are required; `device_id`,
    /// `refresh_interval_secs` and `reauth_interval_secs` are optional.
    pub fn from_entry_data(data: &Value) -> Result<Self> {
        #[derive(Deserialize)]
        struct EntryData {
            #[serde(flatten)]
            credentials: Credentials,
            #[serde(default)]
            device_id: Option<String>,
            #[serde(default)]
            refresh_interval_secs: Option<u64>,
            #[serde(default)]
            reauth_interval_secs: Option<u64>,
        }

        let entry = EntryData::deserialize(data)
            .map_err(|e| Error::Config(format!("invalid entry data: {e}")))?;

        let mut builder = BridgeConfigBuilder::new(entry.credentials);
        if let Some(id) = entry.device_id {
            builder = builder.device_id(id);
        }
        if let Some(secs) = entry.refresh_interval_secs {
            builder = builder.refresh_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = entry.reauth_interval_secs {
            builder = builder.reauth_interval(Duration::from_secs(secs));
        }
        builder.build()
    }
}

pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            config: BridgeConfig {
                credentials,
                device_id: None,
                refresh_interval: DEFAULT_REFRESH_INTERVAL,
                reauth_interval: DEFAULT_REAUTH_INTERVAL,
                debounce_delay: DEFAULT_DEBOUNCE_DELAY,
                fan_debounce_delay: DEFAULT_FAN_DEBOUNCE_DELAY,
                completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
                completion_poll_interval: DEFAULT_COMPLETION_POLL_INTERVAL,
                bus_capacity: DEFAULT_BUS_CAPACITY,
                message_log: None,
            },
        }
    }

    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.config.device_id = Some(id.into());
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.config.refresh_interval = interval;
        self
    }

    pub fn reauth_interval(mut self, interval: Duration) -> Self {
        self.config.reauth_interval = interval;
        self
    }

    pub fn debounce_delay(mut self, delay: Duration) -> Self {
        self.config.debounce_delay = delay;
        self
    }

    pub fn fan_debounce_delay(mut self, delay: Duration) -> Self {
        self.config.fan_debounce_delay = delay;
        self
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout = timeout;
        self
    }

    pub fn completion_poll_interval(mut self, interval: Duration) -> Self {
        self.config.completion_poll_interval = interval;
        self
    }

    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.config.bus_capacity = capacity;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<PathBuf>) -> Self {
        self.config.message_log = Some((mode, path.into()));
        self
    }

    pub fn build(self) -> Result<BridgeConfig> {
        let c = &self.config;
        let intervals = [
            ("refresh_interval", c.refresh_interval),
            ("reauth_interval", c.reauth_interval),
            ("completion_timeout", c.completion_timeout),
            ("completion_poll_interval", c.completion_poll_interval),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, d)| d.is_zero()) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }
        if c.bus_capacity == 0 {
            return Err(Error::Config("bus_capacity must be greater than zero".into()));
        }
        if c.credentials.app_key.is_empty() || c.credentials.app_secret.is_empty() {
            return Err(Error::Config("app_key and app_secret are required".into()));
        }
        Ok(self.config)
    }
}
