use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::client::CloudClient;
use crate::coordinator::Coordinator;
use crate::types::Device;
use crate::Error;

/// How a call to [`Coordinator::execute_and_refresh`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// The server confirmed every control and the snapshot was re-read.
    Confirmed,
    /// The server accepted the write; a debounced refresh will pick up the
    /// result.
    Accepted,
    /// The write was rejected or never reached the server. Queued updates
    /// were discarded.
    Failed,
    /// Nothing was queued on the device.
    NothingQueued,
}

impl<C: CloudClient> Coordinator<C> {
    /// Send the updates queued on `device`, then schedule a refresh, using
    /// the configured debounce delay.
    pub async fn execute_and_refresh(&self, device: &Device) -> ExecuteOutcome {
        self.execute_and_refresh_with(device, self.inner.config.debounce_delay)
            .await
    }

    /// Like [`execute_and_refresh`](Self::execute_and_refresh) with an
    /// explicit debounce delay.
    ///
    /// The device's queue is empty when this returns, whatever happened.
    pub async fn execute_and_refresh_with(&self, device: &Device, debounce: Duration) -> ExecuteOutcome {
        let updates = device.pending_updates();
        if updates.is_empty() {
            debug!(device_id = %device.device_id(), "no queued updates to execute");
            return ExecuteOutcome::NothingQueued;
        }
        info!(device_id = %device.device_id(), updates = ?updates, "executing queued updates");

        let session = &self.inner.session;
        let sent = session
            .retry_after_login("execute", || session.client().execute_queued_updates(device))
            .await;
        device.clear_pending_updates();

        let result = match sent {
            Ok(result) => result,
            Err(e) => {
                error!(device_id = %device.device_id(), error = %e, "failed to execute updates, discarding queue");
                self.inner
                    .journal
                    .record(|l| l.log_error("execute", &e.to_string()));
                return ExecuteOutcome::Failed;
            }
        };

        self.inner
            .journal
            .record(|l| l.log_control(device.device_id(), &updates, &result.control_ids));

        // The snapshot already holds the requested values.
        self.publish_optimistic();

        if result.control_ids.is_empty() {
            debug!("no control ids returned, scheduling debounced refresh");
            self.debounced_refresh(debounce);
            return ExecuteOutcome::Accepted;
        }

        self.await_completion(device, &result.control_ids, debounce)
            .await
    }

    async fn await_completion(&self, device: &Device, control_ids: &[String], debounce: Duration) -> ExecuteOutcome {
        let config = &self.inner.config;
        debug!(control_ids = ?control_ids, "waiting for control completion");

        let waited = self
            .inner
            .session
            .client()
            .wait_for_control_completion(
                device,
                control_ids,
                config.completion_timeout,
                config.completion_poll_interval,
            )
            .await;

        let outcome = match &waited {
            Ok(_) => "completed",
            Err(Error::Timeout) => "timeout",
            Err(_) => "error",
        };
        self.inner
            .journal
            .record(|l| l.log_completion(device.device_id(), control_ids, outcome));

        match waited {
            Ok(completion) => {
                debug!(completed = ?completion.completed, "controls completed, refreshing");
                self.refresh().await;
                ExecuteOutcome::Confirmed
            }
            Err(Error::Timeout) => {
                warn!("control completion timed out, falling back to debounced refresh");
                self.debounced_refresh(debounce);
                ExecuteOutcome::Accepted
            }
            Err(e) => {
                error!(error = %e, "error waiting for control completion, falling back to debounced refresh");
                self.debounced_refresh(debounce);
                ExecuteOutcome::Accepted
            }
        }
    }
}
