//! Transport trait

use crate::error::Result;
use crate::types::{CallOutcome, ConnectivityResult};
use async_trait::async_trait;

/// One-message-per-call delivery to the relay endpoint
///
/// Implementations classify every call they attempt into a [`CallOutcome`].
/// The `Err` branch of [`Transport::send`] is reserved for conditions that are
/// not a single call's failure (a request that cannot even be built, for
/// instance); the dispatcher treats it as an internal failure and ends the run.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use batch_relay::transport::Transport;
/// use batch_relay::types::{CallOutcome, ConnectivityResult};
///
/// struct AlwaysAccepts;
///
/// #[async_trait]
/// impl Transport for AlwaysAccepts {
///     async fn send(&self, _target: &str, _message: &str) -> batch_relay::Result<CallOutcome> {
///         Ok(CallOutcome::success(200, r#"{"status":"success"}"#))
///     }
///
///     async fn probe(&self) -> ConnectivityResult {
///         ConnectivityResult {
///             connected: true,
///             status: Some(200),
///             reason: None,
///             latency: None,
///             timestamp: chrono::Utc::now(),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` to `target` once
    ///
    /// The returned outcome's index is assigned by the caller.
    async fn send(&self, target: &str, message: &str) -> Result<CallOutcome>;

    /// Check whether the relay endpoint is reachable
    ///
    /// Never affects any run's counters.
    async fn probe(&self) -> ConnectivityResult;
}
