//! HTTP relay transport over `reqwest`.

use super::traits::Transport;
use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::types::{CallOutcome, ConnectivityResult};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::time::error::Elapsed;

/// Failure reason recorded when a call exceeds its timeout
pub const TIMEOUT_REASON: &str = "timeout";

/// Failure reason recorded when a 2xx body lacks the success marker
pub const MISSING_MARKER_REASON: &str = "response did not contain success marker";

/// Relay transport issuing one GET per call
///
/// Each call carries the target link, the message and a count of 1 as
/// URL-encoded query parameters. A call succeeds when the status is 2xx and
/// the body contains the configured marker, compared case-insensitively.
///
/// # Examples
///
/// ```no_run
/// use batch_relay::config::EndpointConfig;
/// use batch_relay::transport::{HttpTransport, Transport};
///
/// # async fn example() -> batch_relay::Result<()> {
/// let transport = HttpTransport::new(EndpointConfig::new("https://relay.example/api/send"))?;
///
/// let outcome = transport.send("https://ngl.link/someone", "hello").await?;
/// println!("accepted: {}", outcome.success);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: url::Url,
    config: EndpointConfig,
    marker: String,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint
    ///
    /// Fails with [`Error::Config`] if the endpoint URL is missing or invalid,
    /// or with [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(config: EndpointConfig) -> Result<Self> {
        let endpoint = url::Url::parse(config.url.trim())
            .map_err(|e| Error::config("endpoint.url", format!("invalid URL: {e}")))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            marker: config.success_marker.to_lowercase(),
            config,
        })
    }

    /// The endpoint every call is sent to
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    fn request(&self, target: &str, message: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                (self.config.link_param.as_str(), target),
                (self.config.message_param.as_str(), message),
                (self.config.count_param.as_str(), "1"),
            ])
    }

    fn is_accepted(&self, body: &str) -> bool {
        body.to_lowercase().contains(&self.marker)
    }

    fn truncate(&self, mut body: String) -> String {
        let max = self.config.max_response_bytes;
        if body.len() > max {
            let mut end = max;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        body
    }
}

/// Run one request with a ceiling on the whole exchange, body included
async fn exchange(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> std::result::Result<reqwest::Result<(reqwest::StatusCode, String)>, Elapsed> {
    tokio::time::timeout(timeout, async {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok::<_, reqwest::Error>((status, body))
    })
    .await
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, target: &str, message: &str) -> Result<CallOutcome> {
        let result = exchange(self.request(target, message), self.config.call_timeout).await;

        let outcome = match result {
            Err(_elapsed) => {
                tracing::warn!(
                    target_link = %target,
                    timeout = ?self.config.call_timeout,
                    "relay call timed out"
                );
                CallOutcome::failure(TIMEOUT_REASON)
            }
            Ok(Err(e)) if e.is_builder() => {
                // The request could not be built: every further call would fail the same way.
                return Err(Error::Network(e));
            }
            Ok(Err(e)) => {
                let reason = if e.is_timeout() {
                    TIMEOUT_REASON.to_string()
                } else {
                    e.to_string()
                };
                tracing::warn!(target_link = %target, error = %reason, "relay call failed");
                CallOutcome::failure(reason)
            }
            Ok(Ok((status, body))) if !status.is_success() => {
                tracing::warn!(target_link = %target, status = %status, "relay returned error status");
                CallOutcome::failure(format!("HTTP {status}"))
                    .with_status(status.as_u16())
                    .with_response(self.truncate(body))
            }
            Ok(Ok((status, body))) => {
                if self.is_accepted(&body) {
                    tracing::debug!(target_link = %target, status = %status, "relay accepted message");
                    CallOutcome::success(status.as_u16(), self.truncate(body))
                } else {
                    tracing::warn!(target_link = %target, status = %status, "relay response lacked success marker");
                    CallOutcome::failure(MISSING_MARKER_REASON)
                        .with_status(status.as_u16())
                        .with_response(self.truncate(body))
                }
            }
        };

        Ok(outcome)
    }

    async fn probe(&self) -> ConnectivityResult {
        let start = Instant::now();
        let request = self.request(&self.config.probe_target, &self.config.probe_message);
        let result = tokio::time::timeout(self.config.probe_timeout, request.send()).await;
        let latency = start.elapsed();

        let (connected, status, reason) = match result {
            Ok(Ok(response)) => {
                let status = response.status();
                let reason = (!status.is_success()).then(|| format!("HTTP {status}"));
                (status.is_success(), Some(status.as_u16()), reason)
            }
            Ok(Err(e)) => (false, None, Some(e.to_string())),
            Err(_) => (false, None, Some(TIMEOUT_REASON.to_string())),
        };

        tracing::info!(
            endpoint = %self.endpoint,
            connected,
            status = ?status,
            latency_ms = latency.as_millis() as u64,
            "relay probe finished"
        );

        ConnectivityResult {
            connected,
            status,
            reason,
            latency: Some(latency),
            timestamp: chrono::Utc::now(),
        }
    }
}
