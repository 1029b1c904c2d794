//! Batch dispatcher split into focused submodules.
//!
//! - [`handle`] - Run handles and the single-flight slot
//! - [`observer`] - Progress observer seam
//! - [`run`] - The dispatch loop

mod handle;
mod observer;
mod run;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use handle::RunHandle;
pub use observer::ProgressObserver;
pub use run::ActiveRun;

use crate::config::Config;
use crate::error::Result;
use crate::transport::{HttpTransport, Transport};
use crate::types::{ConnectivityResult, DispatchRequest, Event, RunState, RunSummary};
use handle::RunSlot;
use std::sync::{Arc, Mutex, PoisonError};

/// Drives batches of relay calls, one run at a time (cloneable - all fields are Arc-wrapped)
///
/// # Examples
///
/// ```no_run
/// use batch_relay::{Config, Dispatcher, DispatchRequest};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let dispatcher = Dispatcher::new(Config::with_endpoint("https://relay.example/api/send"))?;
///
///     let request = DispatchRequest::new("https://ngl.link/someone", "hello", 5, 1000)?;
///     let summary = dispatcher
///         .run_batch(request, |attempted: u32, total: u32, outcome: &batch_relay::CallOutcome| {
///             println!("{attempted}/{total}: {}", outcome.success);
///         })
///         .await?;
///
///     println!("sent {} of {}", summary.sent, summary.total);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    /// Relay transport (trait object for pluggable implementations)
    pub(crate) transport: Arc<dyn Transport>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Single-flight slot holding the active run's handle
    slot: Arc<RunSlot>,
    /// Summary of the most recently finished run
    last_summary: Arc<Mutex<Option<RunSummary>>>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoint", &self.config.endpoint.url)
            .field("active_run", &self.slot.active().map(|h| h.id()))
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher talking to the configured relay endpoint over HTTP
    ///
    /// Validates the configuration first.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.endpoint.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a dispatcher over a custom transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.dispatch.event_capacity.max(1));

        Self {
            transport,
            event_tx,
            slot: Arc::new(RunSlot::default()),
            last_summary: Arc::new(Mutex::new(None)),
            config: Arc::new(config),
        }
    }

    /// The dispatcher's configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to dispatcher events
    ///
    /// Each subscriber receives every event published after it subscribed. A
    /// subscriber that falls behind by more than the channel capacity skips
    /// events (`RecvError::Lagged`); it never slows the dispatch loop.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Publish an event to all subscribers (no-op without subscribers)
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Claim the dispatcher for a run without starting it
    ///
    /// Fails with [`Error::Conflict`](crate::Error::Conflict) while another run
    /// is active and with [`Error::ShuttingDown`](crate::Error::ShuttingDown)
    /// after [`Dispatcher::shutdown`].
    pub fn begin(&self, request: DispatchRequest) -> Result<ActiveRun> {
        let (handle, guard) = self.slot.claim().inspect_err(|e| {
            tracing::warn!(error = %e, "rejected run request");
        })?;

        Ok(ActiveRun::new(self.clone(), request, handle, guard))
    }

    /// Run a batch to completion
    ///
    /// Equivalent to [`Dispatcher::begin`] followed by [`ActiveRun::execute`].
    /// Use [`Dispatcher::cancel_active`] (or [`Dispatcher::active_run`] with
    /// [`Dispatcher::cancel`]) from another task to stop it early.
    pub async fn run_batch<O: ProgressObserver>(
        &self,
        request: DispatchRequest,
        observer: O,
    ) -> Result<RunSummary> {
        self.begin(request)?.execute(observer).await
    }

    /// Request cancellation of the run named by `handle`
    ///
    /// Idempotent. A stale handle or an idle dispatcher makes this a no-op.
    /// Returns whether the call newly signalled an active run.
    pub fn cancel(&self, handle: &RunHandle) -> bool {
        self.signal(Some(handle))
    }

    /// Request cancellation of whatever run is active
    pub fn cancel_active(&self) -> bool {
        self.signal(None)
    }

    fn signal(&self, handle: Option<&RunHandle>) -> bool {
        match self.slot.cancel(handle.map(RunHandle::id)) {
            Some(run_id) => {
                tracing::info!(run_id = %run_id, "cancellation requested");
                self.emit_event(Event::CancelRequested { run_id });
                true
            }
            None => false,
        }
    }

    /// Handle of the active run, if any
    pub fn active_run(&self) -> Option<RunHandle> {
        self.slot.active()
    }

    /// Whether a run currently holds the dispatcher
    pub fn is_running(&self) -> bool {
        self.slot.active().is_some()
    }

    /// `Running` while a run holds the dispatcher, `Idle` otherwise
    pub fn state(&self) -> RunState {
        if self.is_running() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Summary of the most recently finished run
    pub fn last_summary(&self) -> Option<RunSummary> {
        self.last_summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn remember(&self, summary: &RunSummary) {
        *self
            .last_summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(summary.clone());
    }

    /// Check connectivity to the relay endpoint
    ///
    /// Independent of any run; never touches run counters.
    pub async fn probe(&self) -> ConnectivityResult {
        self.transport.probe().await
    }

    /// Wait until no run holds the dispatcher
    pub async fn wait_idle(&self) {
        self.slot.wait_idle().await
    }

    /// Stop accepting runs, cancel the active one and wait for it to wind down
    ///
    /// The in-flight call (if any) is allowed to finish, bounded by the
    /// transport's call timeout.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("dispatcher shutting down");
        if let Some(run_id) = self.slot.close() {
            tracing::info!(run_id = %run_id, "cancelling active run for shutdown");
            self.emit_event(Event::CancelRequested { run_id });
        }
        self.wait_idle().await;
        self.emit_event(Event::Shutdown);
        Ok(())
    }

    /// Spawn the REST API server in a background task
    ///
    /// Listens on the configured bind address (default: 127.0.0.1:6790).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let dispatcher = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(dispatcher, config).await })
    }
}
