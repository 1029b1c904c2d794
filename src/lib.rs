//! # batch-relay
//!
//! Sequential batch dispatcher for a single remote HTTP relay endpoint.
//!
//! A run sends the same message to a target link `count` times, one call
//! after another with a fixed delay in between. Every call is classified as
//! success or failure and reported as it happens; the run ends with a
//! summary of what was sent.
//!
//! - **One run at a time** - a second run while one is active is rejected
//! - **Cooperative cancellation** - checked before every call, interrupts the delay
//! - **Event-driven** - consumers subscribe to events, no polling required
//! - **Pluggable transport** - the HTTP relay sits behind the [`Transport`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use batch_relay::{Config, Dispatcher, DispatchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(Config::with_endpoint("https://relay.example/api/send"))?;
//!
//!     // Subscribe to events
//!     let mut events = dispatcher.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = DispatchRequest::new("https://ngl.link/someone", "hello", 3, 500)?;
//!     let summary = dispatcher.run_batch(request, ()).await?;
//!     println!("{}% delivered", summary.success_rate_pct);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Batch dispatcher (decomposed into focused submodules)
pub mod dispatcher;
/// Error types
pub mod error;
/// Relay endpoint transport
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DispatchConfig, EndpointConfig};
pub use dispatcher::{ActiveRun, Dispatcher, ProgressObserver, RunHandle};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use transport::{HttpTransport, Transport};
pub use types::{
    CallOutcome, ConnectivityResult, DelayMode, DispatchRequest, Event, RunId, RunState,
    RunSummary,
};

/// Helper function to run the dispatcher with graceful signal handling.
///
/// Waits for a termination signal and then calls the dispatcher's `shutdown()` method,
/// which cancels any active run and waits for it to finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use batch_relay::{Config, Dispatcher, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let dispatcher = Dispatcher::new(Config::with_endpoint("https://relay.example/api/send"))?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(dispatcher).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(dispatcher: Dispatcher) -> Result<()> {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "termination signal received, stopping dispatcher");
    dispatcher.shutdown().await
}

/// Resolves with the name of the first termination signal received
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "signal handlers unavailable, waiting for ctrl_c");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "ctrl_c listener failed, stopping dispatcher now");
                }
                return "ctrl_c";
            }
        };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

/// Resolves once Ctrl+C is pressed (or the listener fails)
#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl_c listener failed, stopping dispatcher now");
    }
    "ctrl_c"
}
