// Shared per-integration state: the session, the live device snapshot,
// the event bus, and the background timers that keep them fresh.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bus::{DeviceEvent, EventBus, UpdateSource};
use crate::client::CloudClient;
use crate::config::BridgeConfig;
use crate::debounce::Debouncer;
use crate::diff::changed_properties;
use crate::logger::Journal;
use crate::session::Session;
use crate::types::Device;
use crate::Result;

/// Handle to one integration instance's shared state.
///
/// Cheap to clone; every entity holds one. The device snapshot is only
/// ever replaced by [`Coordinator::refresh`], never merged into.
pub struct Coordinator<C> {
    pub(crate) inner: Arc<Inner<C>>,
}

pub(crate) struct Inner<C> {
    pub(crate) config: BridgeConfig,
    pub(crate) session: Session<C>,
    device_id: String,
    device: Mutex<Arc<Device>>,
    pub(crate) bus: EventBus,
    // One slot per debounce delay, so callers with different delays do
    // not cancel each other.
    debouncers: Mutex<BTreeMap<Duration, Debouncer>>,
    pub(crate) journal: Journal,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<C> Clone for Coordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> Coordinator<C> {
    /// Cancel the periodic timers and every waiting debounced refresh.
    pub(crate) fn stop_timers(&self) {
        self.inner.cancel.cancel();
        for debouncer in self
            .inner
            .debouncers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
        {
            debouncer.cancel();
        }
    }
}

impl<C: CloudClient> Coordinator<C> {
    pub(crate) fn new(
        config: BridgeConfig,
        session: Session<C>,
        device: Device,
        journal: Journal,
    ) -> Self {
        let bus = EventBus::new(config.bus_capacity);
        Self {
            inner: Arc::new(Inner {
                device_id: device.device_id().to_string(),
                device: Mutex::new(Arc::new(device)),
                config,
                session,
                bus,
                debouncers: Mutex::new(BTreeMap::new()),
                journal,
                cancel: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Session<C> {
        &self.inner.session
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    /// The current snapshot. Holders of an older `Arc` keep seeing the
    /// state it had when it was replaced.
    pub fn device(&self) -> Arc<Device> {
        Arc::clone(&self.inner.device.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn replace_device(&self, device: Arc<Device>) -> Arc<Device> {
        let mut slot = self.inner.device.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, device)
    }

    /// Re-query the cloud and swap in the fresh snapshot.
    ///
    /// An authentication failure gets one re-login and one more query; any
    /// other failure is logged and the cycle is skipped. Returns true when
    /// the snapshot was replaced.
    pub async fn refresh(&self) -> bool {
        let session = &self.inner.session;
        match session
            .retry_after_login("refresh", || self.query_and_replace())
            .await
        {
            Ok(replaced) => replaced,
            Err(e) => {
                error!(device_id = %self.inner.device_id, error = %e, "refresh failed, waiting for next cycle");
                self.inner
                    .journal
                    .record(|l| l.log_error("refresh", &e.to_string()));
                false
            }
        }
    }

    async fn query_and_replace(&self) -> Result<bool> {
        let devices = self.inner.session.client().query_devices().await?;
        let device_id = &self.inner.device_id;

        let Some(fresh) = devices.into_iter().find(|d| d.device_id() == device_id) else {
            warn!(device_id = %device_id, "device missing from query result");
            return Ok(false);
        };

        let fresh_properties = fresh.properties();
        self.inner
            .journal
            .record(|l| l.log_query(device_id, &fresh_properties));

        let previous = self.replace_device(Arc::new(fresh));
        let changes = changed_properties(&previous.properties(), &fresh_properties);
        debug!(device_id = %device_id, changed = changes.len(), "device snapshot replaced");

        self.inner
            .bus
            .publish(DeviceEvent::new(device_id.clone(), UpdateSource::Refreshed, changes));
        Ok(true)
    }

    /// Refresh `delay` after the last call with the same delay, collapsing
    /// bursts into one query. Each distinct delay has its own slot; the
    /// periodic timer is unaffected.
    pub fn debounced_refresh(&self, delay: Duration) {
        let this = self.clone();
        debug!(delay_ms = delay.as_millis() as u64, "scheduling debounced refresh");
        self.inner
            .debouncers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(delay)
            .or_default()
            .schedule(delay, async move {
                this.refresh().await;
            });
    }

    /// Whether any debounced refresh is still waiting.
    pub fn refresh_pending(&self) -> bool {
        self.inner
            .debouncers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .any(Debouncer::is_pending)
    }

    pub(crate) fn publish_optimistic(&self) {
        self.inner.bus.publish(DeviceEvent::new(
            self.inner.device_id.clone(),
            UpdateSource::Optimistic,
            Vec::new(),
        ));
    }

    /// Start the periodic refresh and proactive re-authentication timers.
    pub fn start(&self) {
        let cancel = self.inner.cancel.child_token();
        let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);

        tasks.push(tokio::spawn(refresh_task(
            self.clone(),
            self.inner.config.refresh_interval,
            cancel.clone(),
        )));
        tasks.push(tokio::spawn(reauth_task(
            self.clone(),
            self.inner.session.reauth_interval(),
            cancel,
        )));
        info!(
            refresh_secs = self.inner.config.refresh_interval.as_secs(),
            reauth_secs = self.inner.session.reauth_interval().as_secs(),
            "background timers started"
        );
    }

    /// Stop the timers, drop any waiting debounced refresh and close the
    /// session. In-flight calls are left to finish.
    pub async fn shutdown(&self) {
        self.stop_timers();

        let tasks: Vec<JoinHandle<()>> = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }

        self.inner.session.close().await;
        info!(device_id = %self.inner.device_id, "coordinator stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }
}

async fn refresh_task<C: CloudClient>(
    coordinator: Coordinator<C>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                coordinator.refresh().await;
            }
        }
    }
}

async fn reauth_task<C: CloudClient>(
    coordinator: Coordinator<C>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !coordinator.session().ensure_authenticated().await {
                    warn!("proactive re-authentication failed, will retry next cycle");
                }
            }
        }
    }
}
