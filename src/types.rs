//! Core types for batch-relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Maximum message length in characters
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Smallest accepted message count for one run
pub const MIN_COUNT: u32 = 1;

/// Largest accepted message count for one run
pub const MAX_COUNT: u32 = 1000;

/// Unique identifier for a run, increasing per dispatcher instance
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl RunId {
    /// Create a new RunId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RunId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run lifecycle state
///
/// `Idle -> Running -> {Completed, Cancelled, Failed}`. A finished
/// [`RunSummary`] always carries one of the three terminal states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run active
    Idle,
    /// Dispatch loop in progress
    Running,
    /// Every requested call was attempted
    Completed,
    /// Stopped early by a cancel request
    Cancelled,
    /// Stopped early by an internal failure
    Failed,
}

impl RunState {
    /// Whether this state ends a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

/// Named pacing presets for the delay between calls
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DelayMode {
    /// No delay between calls
    Instant,
    /// 500 ms between calls
    Fast,
    /// 1 second between calls (default)
    #[default]
    Normal,
    /// 2 seconds between calls
    Slow,
}

impl DelayMode {
    /// Delay in milliseconds for this mode
    pub fn as_millis(&self) -> u64 {
        match self {
            DelayMode::Instant => 0,
            DelayMode::Fast => 500,
            DelayMode::Normal => 1000,
            DelayMode::Slow => 2000,
        }
    }

    /// Delay as a [`Duration`]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.as_millis())
    }
}

/// A validated request for one run
///
/// Only constructible through [`DispatchRequest::new`], so every value that
/// reaches the dispatcher has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    target: String,
    message: String,
    count: u32,
    #[serde(rename = "delay_ms", serialize_with = "serialize_millis")]
    delay: Duration,
}

impl DispatchRequest {
    /// Validate caller input and build a request
    ///
    /// - `target` must be an `http`/`https` URL with a host
    /// - `message` must be 1..=500 characters after trimming
    /// - `count` must be within 1..=1000
    ///
    /// # Examples
    ///
    /// ```
    /// use batch_relay::types::DispatchRequest;
    ///
    /// let request = DispatchRequest::new("https://relay.example/inbox", "hi", 3, 0).unwrap();
    /// assert_eq!(request.count(), 3);
    ///
    /// assert!(DispatchRequest::new("not a link", "hi", 3, 0).is_err());
    /// assert!(DispatchRequest::new("https://relay.example/inbox", "  ", 3, 0).is_err());
    /// assert!(DispatchRequest::new("https://relay.example/inbox", "hi", 0, 0).is_err());
    /// ```
    pub fn new(
        target: impl AsRef<str>,
        message: impl AsRef<str>,
        count: u32,
        delay_ms: u64,
    ) -> Result<Self> {
        let target = validate_target(target.as_ref())?;
        let message = validate_message(message.as_ref())?;

        if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
            return Err(Error::validation(
                "count",
                format!("must be between {MIN_COUNT} and {MAX_COUNT}, got {count}"),
            ));
        }

        Ok(Self {
            target,
            message,
            count,
            delay: Duration::from_millis(delay_ms),
        })
    }

    /// Target link the message is delivered to
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Message text
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Number of calls to make
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Pause between consecutive calls
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

fn validate_target(raw: &str) -> Result<String> {
    let target = raw.trim();
    if target.is_empty() {
        return Err(Error::validation("target", "must not be empty"));
    }

    let parsed = url::Url::parse(target)
        .map_err(|e| Error::validation("target", format!("not a valid link: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::validation(
            "target",
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::validation("target", "link has no host"));
    }

    Ok(target.to_string())
}

fn validate_message(raw: &str) -> Result<String> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(Error::validation("message", "must not be empty"));
    }

    let chars = message.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(Error::validation(
            "message",
            format!("must be at most {MAX_MESSAGE_CHARS} characters, got {chars}"),
        ));
    }

    Ok(message.to_string())
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Recorded result of one attempted call
///
/// Transports build outcomes with index 0; the dispatcher stamps the
/// 1-based index and the timestamp before anyone else sees the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CallOutcome {
    /// 1-based position in the run
    pub index: u32,

    /// Whether the relay accepted the message
    pub success: bool,

    /// Response body (possibly truncated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,

    /// Why the call failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,

    /// HTTP status code, when a response was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,

    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,
}

impl CallOutcome {
    /// A call the relay accepted
    pub fn success(http_status: u16, raw_response: impl Into<String>) -> Self {
        Self {
            index: 0,
            success: true,
            raw_response: Some(raw_response.into()),
            error_reason: None,
            http_status: Some(http_status),
            timestamp: Utc::now(),
        }
    }

    /// A call that failed for `reason`
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            index: 0,
            success: false,
            raw_response: None,
            error_reason: Some(reason.into()),
            http_status: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the HTTP status of a failed call
    pub fn with_status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }

    /// Attach the response body of a failed call
    pub fn with_response(mut self, raw_response: impl Into<String>) -> Self {
        self.raw_response = Some(raw_response.into());
        self
    }

    pub(crate) fn stamp(mut self, index: u32) -> Self {
        self.index = index;
        self.timestamp = Utc::now();
        self
    }
}

/// Final summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RunSummary {
    /// Which run this summarizes
    pub run_id: RunId,

    /// Terminal state the run reached
    pub state: RunState,

    /// Calls attempted (`sent + failed`)
    pub attempted: u32,

    /// Calls the relay accepted
    pub sent: u32,

    /// Calls that failed
    pub failed: u32,

    /// Calls requested
    pub total: u32,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run was finalized
    pub ended_at: DateTime<Utc>,

    /// `ended_at - started_at` in milliseconds
    pub duration_ms: u64,

    /// `round(100 * sent / attempted)`, 0 when nothing was attempted
    pub success_rate_pct: u32,

    /// Every outcome in index order
    pub outcomes: Vec<CallOutcome>,
}

/// Percentage of accepted calls, rounded to the nearest integer
///
/// Returns 0 when nothing was attempted.
///
/// ```
/// use batch_relay::types::success_rate_pct;
///
/// assert_eq!(success_rate_pct(0, 0), 0);
/// assert_eq!(success_rate_pct(2, 1), 67);
/// assert_eq!(success_rate_pct(3, 0), 100);
/// ```
pub fn success_rate_pct(sent: u32, failed: u32) -> u32 {
    let attempted = u64::from(sent) + u64::from(failed);
    if attempted == 0 {
        return 0;
    }
    (u64::from(sent) as f64 * 100.0 / attempted as f64).round() as u32
}

/// Incremental record of a run in progress
///
/// Owned exclusively by the dispatch loop. [`RunTally::finish`] consumes it,
/// so a summary is finalized exactly once.
#[derive(Debug)]
pub(crate) struct RunTally {
    run_id: RunId,
    total: u32,
    started_at: DateTime<Utc>,
    sent: u32,
    failed: u32,
    outcomes: Vec<CallOutcome>,
}

impl RunTally {
    pub(crate) fn new(run_id: RunId, total: u32) -> Self {
        Self {
            run_id,
            total,
            started_at: Utc::now(),
            sent: 0,
            failed: 0,
            outcomes: Vec::with_capacity(total as usize),
        }
    }

    /// Append an outcome and return the new attempted count
    pub(crate) fn record(&mut self, outcome: CallOutcome) -> u32 {
        if outcome.success {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
        self.attempted()
    }

    pub(crate) fn attempted(&self) -> u32 {
        self.sent + self.failed
    }

    pub(crate) fn finish(self, state: RunState) -> RunSummary {
        let ended_at = Utc::now().max(self.started_at);
        let duration_ms = (ended_at - self.started_at).num_milliseconds().max(0) as u64;

        RunSummary {
            run_id: self.run_id,
            state,
            attempted: self.sent + self.failed,
            sent: self.sent,
            failed: self.failed,
            total: self.total,
            started_at: self.started_at,
            ended_at,
            duration_ms,
            success_rate_pct: success_rate_pct(self.sent, self.failed),
            outcomes: self.outcomes,
        }
    }
}

/// Result of a relay connectivity probe
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectivityResult {
    /// Whether the relay answered with a 2xx status
    pub connected: bool,

    /// HTTP status code (if a response was received)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Failure description (if not connected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Round-trip time of the probe
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub latency: Option<Duration>,

    /// When the probe finished
    pub timestamp: DateTime<Utc>,
}

/// Events emitted by the dispatcher
///
/// Consumers subscribe with [`Dispatcher::subscribe`](crate::Dispatcher::subscribe).
/// The synchronous progress observer passed to a run sees the same outcomes
/// first; events are a fan-out for passive listeners.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run claimed the dispatcher and is about to send its first call
    RunStarted {
        /// Run ID
        run_id: RunId,
        /// Target link
        target: String,
        /// Calls requested
        total: u32,
        /// Delay between calls in milliseconds
        delay_ms: u64,
    },

    /// One call finished and was recorded
    CallCompleted {
        /// Run ID
        run_id: RunId,
        /// Calls attempted so far
        attempted: u32,
        /// Calls requested
        total: u32,
        /// The recorded outcome
        outcome: CallOutcome,
    },

    /// Cancellation was requested for a run
    CancelRequested {
        /// Run ID
        run_id: RunId,
    },

    /// A run reached a terminal state
    RunFinished {
        /// Run ID
        run_id: RunId,
        /// Terminal state
        state: RunState,
        /// Calls attempted
        attempted: u32,
        /// Calls accepted
        sent: u32,
        /// Calls failed
        failed: u32,
        /// Calls requested
        total: u32,
        /// Success rate percentage
        success_rate_pct: u32,
        /// Run duration in milliseconds
        duration_ms: u64,
    },

    /// Dispatcher is shutting down
    Shutdown,
}

impl Event {
    /// Snake-case event name (matches the serialized `type` tag)
    pub fn name(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "run_started",
            Event::CallCompleted { .. } => "call_completed",
            Event::CancelRequested { .. } => "cancel_requested",
            Event::RunFinished { .. } => "run_finished",
            Event::Shutdown => "shutdown",
        }
    }

    pub(crate) fn finished(summary: &RunSummary) -> Self {
        Event::RunFinished {
            run_id: summary.run_id,
            state: summary.state,
            attempted: summary.attempted,
            sent: summary.sent,
            failed: summary.failed,
            total: summary.total,
            success_rate_pct: summary.success_rate_pct,
            duration_ms: summary.duration_ms,
        }
    }
}
