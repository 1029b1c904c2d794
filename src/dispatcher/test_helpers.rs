//! Test doubles for dispatcher tests.

use crate::Config;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::{CallOutcome, ConnectivityResult, DispatchRequest};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub(crate) const TARGET: &str = "https://ngl.link/test";

/// What the scripted transport does for one call
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Relay accepts the message
    Accept,
    /// Relay rejects the message with the given reason
    Reject(&'static str),
    /// Call takes `Duration` before resolving to the inner step
    Slow(Duration, Box<Step>),
    /// Transport fails outside of the call itself
    Broken(&'static str),
}

/// Transport whose behaviour is a function of the 1-based call number
pub(crate) struct ScriptedTransport {
    script: Box<dyn Fn(u32) -> Step + Send + Sync>,
    calls: AtomicU32,
    probes: AtomicU32,
}

impl ScriptedTransport {
    pub(crate) fn new(script: impl Fn(u32) -> Step + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicU32::new(0),
            probes: AtomicU32::new(0),
        })
    }

    pub(crate) fn always_accept() -> Arc<Self> {
        Self::new(|_| Step::Accept)
    }

    /// Accept odd calls, reject even ones
    pub(crate) fn alternating() -> Arc<Self> {
        Self::new(|call| {
            if call % 2 == 1 {
                Step::Accept
            } else {
                Step::Reject("HTTP 500 Internal Server Error")
            }
        })
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn probes(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }
}

async fn perform(step: Step) -> Result<CallOutcome> {
    let mut step = step;
    loop {
        match step {
            Step::Accept => return Ok(CallOutcome::success(200, r#"{"status":"success"}"#)),
            Step::Reject(reason) => return Ok(CallOutcome::failure(reason)),
            Step::Broken(reason) => return Err(Error::Io(std::io::Error::other(reason))),
            Step::Slow(latency, next) => {
                tokio::time::sleep(latency).await;
                step = *next;
            }
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _target: &str, _message: &str) -> Result<CallOutcome> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        perform((self.script)(call)).await
    }

    async fn probe(&self) -> ConnectivityResult {
        self.probes.fetch_add(1, Ordering::SeqCst);
        ConnectivityResult {
            connected: true,
            status: Some(200),
            reason: None,
            latency: Some(Duration::from_millis(3)),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Dispatcher over the given scripted transport with default config
pub(crate) fn create_test_dispatcher(transport: Arc<ScriptedTransport>) -> Dispatcher {
    Dispatcher::with_transport(Config::default(), transport)
}

pub(crate) fn request(count: u32, delay_ms: u64) -> DispatchRequest {
    DispatchRequest::new(TARGET, "hi", count, delay_ms).unwrap()
}
