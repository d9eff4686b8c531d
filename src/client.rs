use std::future::Future;
use std::time::Duration;

use crate::types::{ControlCompletion, ControlResult, Credentials, Device};
use crate::Result;

/// The vendor cloud client.
///
/// Implementations own the token lifecycle, property encoding and HTTP
/// transport. Errors that mean "the session was rejected" should be
/// reported as [`Error::Unauthorized`](crate::Error::Unauthorized) or a
/// 401 [`Error::Remote`](crate::Error::Remote) where possible; other
/// shapes are classified by message text.
pub trait CloudClient: Send + Sync + 'static {
    fn login(&self, credentials: &Credentials) -> impl Future<Output = Result<()>> + Send;

    /// All devices registered to the account, in vendor order.
    fn query_devices(&self) -> impl Future<Output = Result<Vec<Device>>> + Send;

    /// Send every update queued on `device` as one control request.
    fn execute_queued_updates(
        &self,
        device: &Device,
    ) -> impl Future<Output = Result<ControlResult>> + Send;

    /// Poll until all `control_ids` report completion. Returns
    /// [`Error::Timeout`](crate::Error::Timeout) when `timeout` elapses first.
    fn wait_for_control_completion(
        &self,
        device: &Device,
        control_ids: &[String],
        timeout: Duration,
        poll_interval: Duration,
    ) -> impl Future<Output = Result<ControlCompletion>> + Send;

    /// Release the underlying connection.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
