use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::client::CloudClient;
use crate::error::{classify, Failure};
use crate::logger::Journal;
use crate::types::Credentials;
use crate::Result;

pub const DEFAULT_REAUTH_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
struct LoginStamp {
    // Monotonic, for age checks.
    at: Instant,
    wall: DateTime<Utc>,
}

/// One authenticated connection to the vendor cloud.
///
/// The last-login timestamp is only ever written by [`Session::login`].
pub struct Session<C> {
    client: C,
    credentials: Credentials,
    last_login: Mutex<Option<LoginStamp>>,
    reauth_interval: Duration,
    journal: Journal,
}

impl<C: CloudClient> Session<C> {
    pub fn new(client: C, credentials: Credentials, reauth_interval: Duration) -> Self {
        Self {
            client,
            credentials,
            last_login: Mutex::new(None),
            reauth_interval,
            journal: Journal::disabled(),
        }
    }

    pub(crate) fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.stamp().map(|s| s.wall)
    }

    fn stamp(&self) -> Option<LoginStamp> {
        *self.last_login.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reauth_interval(&self) -> Duration {
        self.reauth_interval
    }

    pub async fn login(&self) -> Result<()> {
        debug!(app_key = %self.credentials.app_key, "logging in");
        let result = self.client.login(&self.credentials).await;
        self.journal
            .record(|l| l.log_login(&self.credentials.app_key, result.is_ok()));
        result?;
        let stamp = LoginStamp {
            at: Instant::now(),
            wall: Utc::now(),
        };
        *self.last_login.lock().unwrap_or_else(PoisonError::into_inner) = Some(stamp);
        info!(at = %stamp.wall, "login succeeded");
        Ok(())
    }

    /// Whether the reauth interval has passed since the last login.
    pub fn needs_login(&self) -> bool {
        match self.stamp() {
            Some(stamp) => stamp.at.elapsed() >= self.reauth_interval,
            None => true,
        }
    }

    /// Log in again if the session is older than the reauth interval.
    ///
    /// Returns false if a login was needed and failed; the failure is
    /// logged rather than returned.
    pub async fn ensure_authenticated(&self) -> bool {
        if !self.needs_login() {
            return true;
        }
        info!("session older than reauth interval, logging in");
        match self.login().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "proactive re-authentication failed");
                false
            }
        }
    }

    /// Run `call`; if it fails with an authentication-shaped error, log in
    /// once and run it exactly one more time.
    ///
    /// Non-auth failures and a failing re-login are returned as-is without
    /// a retry.
    pub async fn retry_after_login<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if classify(&err) != Failure::Authentication {
            return Err(err);
        }

        warn!(operation, error = %err, "authentication error, attempting to re-login");
        self.login().await?;
        call().await
    }

    pub async fn close(&self) {
        debug!("closing session");
        self.client.close().await;
    }
}
