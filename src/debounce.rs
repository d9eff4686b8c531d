use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Single-slot delayed task.
///
/// Scheduling replaces whatever is waiting in the slot, so a burst of
/// requests collapses into one run `delay` after the last request. Only the
/// wait is cancellable: once the delay has elapsed the work is detached and
/// runs to completion even if another request arrives.
#[derive(Default)]
pub struct Debouncer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&self, delay: Duration, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(work);
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous
            && !previous.is_finished()
        {
            trace!("replacing pending debounced run");
            previous.abort();
        }
    }

    /// Whether a run is still waiting for its delay to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Drop the waiting run, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
