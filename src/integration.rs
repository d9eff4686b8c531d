use tracing::{error, info};

use crate::client::CloudClient;
use crate::config::BridgeConfig;
use crate::coordinator::Coordinator;
use crate::entity::{ClimateEntity, FanEntity, TemperatureSensor};
use crate::error::{classify, Failure};
use crate::logger::Journal;
use crate::session::Session;
use crate::types::{Credentials, Device};
use crate::{Error, Result};

/// One configured integration instance: the shared coordinator and the
/// entities attached to it.
pub struct Integration<C> {
    coordinator: Coordinator<C>,
    climate: ClimateEntity<C>,
    fan: FanEntity<C>,
    sensor: TemperatureSensor<C>,
}

impl<C: CloudClient> Integration<C> {
    /// Log in, discover the device and start the background timers.
    ///
    /// Any failure closes `client` and is reported as [`Error::Setup`].
    pub async fn setup(config: BridgeConfig, client: C) -> Result<Self> {
        let journal = match &config.message_log {
            Some((mode, path)) => match Journal::open(*mode, path) {
                Ok(journal) => journal,
                Err(e) => {
                    client.close().await;
                    return Err(setup_error("message log", e.into()));
                }
            },
            None => Journal::disabled(),
        };

        info!(app_key = %config.credentials.app_key, "initializing integration");
        let session = Session::new(client, config.credentials.clone(), config.reauth_interval)
            .with_journal(journal.clone());

        if let Err(e) = session.login().await {
            session.close().await;
            return Err(setup_error("login", e));
        }

        let devices = match session.client().query_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                session.close().await;
                return Err(setup_error("device query", e));
            }
        };

        let device = match select_device(devices, config.device_id.as_deref()) {
            Ok(device) => device,
            Err(e) => {
                session.close().await;
                return Err(setup_error("device selection", e));
            }
        };
        info!(name = %device.name(), device_id = %device.device_id(), "discovered device");
        journal.record(|l| l.log_query(device.device_id(), &device.properties()));

        let coordinator = Coordinator::new(config, session, device, journal);
        coordinator.start();

        Ok(Self {
            climate: ClimateEntity::new(coordinator.clone()),
            fan: FanEntity::new(coordinator.clone()),
            sensor: TemperatureSensor::new(coordinator.clone()),
            coordinator,
        })
    }

    pub fn coordinator(&self) -> &Coordinator<C> {
        &self.coordinator
    }

    pub fn climate(&self) -> &ClimateEntity<C> {
        &self.climate
    }

    pub fn fan(&self) -> &FanEntity<C> {
        &self.fan
    }

    pub fn sensor(&self) -> &TemperatureSensor<C> {
        &self.sensor
    }

    /// Stop timers and close the session.
    pub async fn unload(self) {
        self.coordinator.shutdown().await;
    }
}

/// Dropping without [`Integration::unload`] still stops the timers; the
/// session is only closed by `unload`.
impl<C> Drop for Integration<C> {
    fn drop(&mut self) {
        self.coordinator.stop_timers();
    }
}

fn setup_error(stage: &'static str, source: Error) -> Error {
    error!(stage, error = %source, "integration failed to start");
    Error::Setup {
        stage,
        source: Box::new(source),
    }
}

/// The configured device, or the first one when none is configured.
fn select_device(devices: Vec<Device>, device_id: Option<&str>) -> Result<Device> {
    match device_id {
        Some(id) => devices
            .into_iter()
            .find(|d| d.device_id() == id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string())),
        None => devices.into_iter().next().ok_or(Error::NoDevices),
    }
}

/// Check that `credentials` are accepted, as done before saving a new
/// configuration entry. Rejections come back as [`Error::Unauthorized`].
pub async fn validate_credentials<C: CloudClient>(client: &C, credentials: &Credentials) -> Result<()> {
    match client.login(credentials).await {
        Ok(()) => Ok(()),
        Err(e) if classify(&e) == Failure::Authentication => Err(Error::Unauthorized(e.to_string())),
        Err(e) => Err(e),
    }
}
