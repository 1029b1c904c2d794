//! Configuration types for batch-relay

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};
use utoipa::ToSchema;

/// Relay endpoint settings
///
/// The endpoint URL has no default: the embedding application always decides
/// which relay service it talks to.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EndpointConfig {
    /// Base URL of the relay endpoint (query parameters are appended)
    #[serde(default)]
    pub url: String,

    /// Query parameter carrying the target link (default: "link")
    #[serde(default = "default_link_param")]
    pub link_param: String,

    /// Query parameter carrying the message text (default: "pesan")
    #[serde(default = "default_message_param")]
    pub message_param: String,

    /// Query parameter carrying the per-call count, always 1 (default: "jumlah")
    #[serde(default = "default_count_param")]
    pub count_param: String,

    /// Marker searched for (case-insensitively) in the response body to
    /// classify a call as accepted (default: "success")
    #[serde(default = "default_success_marker")]
    pub success_marker: String,

    /// User-Agent header sent with every call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Ceiling for one relay call, response body included (default: 30 seconds)
    #[serde(default = "default_call_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub call_timeout: Duration,

    /// Ceiling for a connectivity probe (default: 10 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub probe_timeout: Duration,

    /// Known-safe target link used by the connectivity probe (default: "https://ngl.link/test")
    #[serde(default = "default_probe_target")]
    pub probe_target: String,

    /// Message used by the connectivity probe
    #[serde(default = "default_probe_message")]
    pub probe_message: String,

    /// Response bodies longer than this are truncated in recorded outcomes (default: 4096)
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            link_param: default_link_param(),
            message_param: default_message_param(),
            count_param: default_count_param(),
            success_marker: default_success_marker(),
            user_agent: default_user_agent(),
            call_timeout: default_call_timeout(),
            probe_timeout: default_probe_timeout(),
            probe_target: default_probe_target(),
            probe_message: default_probe_message(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl EndpointConfig {
    /// Endpoint settings for the given relay URL, everything else defaulted
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Dispatch behavior settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchConfig {
    /// Delay used by the API when a request names neither a delay nor a mode (default: 1000)
    #[serde(default = "default_delay_ms")]
    pub default_delay_ms: u64,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: default_delay_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: any)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Serve Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for [`Dispatcher`](crate::Dispatcher)
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Relay endpoint settings
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Dispatch behavior settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Configuration for the given relay URL, everything else defaulted
    pub fn with_endpoint(url: impl Into<String>) -> Self {
        Self {
            endpoint: EndpointConfig::new(url),
            ..Default::default()
        }
    }

    /// Check the configuration for values the dispatcher cannot work with
    pub fn validate(&self) -> Result<()> {
        let endpoint = &self.endpoint;

        if endpoint.url.trim().is_empty() {
            return Err(Error::config("endpoint.url", "relay endpoint URL is required"));
        }
        let parsed = url::Url::parse(&endpoint.url)
            .map_err(|e| Error::config("endpoint.url", format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(
                "endpoint.url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        for (key, value) in [
            ("endpoint.link_param", &endpoint.link_param),
            ("endpoint.message_param", &endpoint.message_param),
            ("endpoint.count_param", &endpoint.count_param),
            ("endpoint.success_marker", &endpoint.success_marker),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(key, "must not be empty"));
            }
        }

        if endpoint.call_timeout.is_zero() {
            return Err(Error::config("endpoint.call_timeout", "must be greater than zero"));
        }
        if endpoint.probe_timeout.is_zero() {
            return Err(Error::config("endpoint.probe_timeout", "must be greater than zero"));
        }
        if self.dispatch.event_capacity == 0 {
            return Err(Error::config("dispatch.event_capacity", "must be greater than zero"));
        }

        Ok(())
    }
}

fn default_link_param() -> String {
    "link".to_string()
}

fn default_message_param() -> String {
    "pesan".to_string()
}

fn default_count_param() -> String {
    "jumlah".to_string()
}

fn default_success_marker() -> String {
    "success".to_string()
}

fn default_user_agent() -> String {
    format!("batch-relay/{}", env!("CARGO_PKG_VERSION"))
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_probe_target() -> String {
    "https://ngl.link/test".to_string()
}

fn default_probe_message() -> String {
    "test".to_string()
}

fn default_max_response_bytes() -> usize {
    4096
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_event_capacity() -> usize {
    1000
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config_key(err: Error) -> String {
        match err {
            Error::Config { key, .. } => key.unwrap_or_default(),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint.call_timeout, Duration::from_secs(30));
        assert_eq!(config.endpoint.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.endpoint.success_marker, "success");
        assert_eq!(config.dispatch.default_delay_ms, 1000);
        assert_eq!(config.api.bind_address.port(), 6790);
    }

    #[test]
    fn test_default_config_requires_endpoint() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(config_key(err), "endpoint.url");
    }

    #[test]
    fn test_with_endpoint_validates() {
        Config::with_endpoint("https://relay.example/api/send")
            .validate()
            .unwrap();
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let err = Config::with_endpoint("ftp://relay.example")
            .validate()
            .unwrap_err();
        assert_eq!(config_key(err), "endpoint.url");
    }

    #[test]
    fn test_rejects_zero_timeouts_and_capacity() {
        let mut config = Config::with_endpoint("http://localhost:9000/send");
        config.endpoint.call_timeout = Duration::ZERO;
        assert_eq!(config_key(config.validate().unwrap_err()), "endpoint.call_timeout");

        let mut config = Config::with_endpoint("http://localhost:9000/send");
        config.dispatch.event_capacity = 0;
        assert_eq!(
            config_key(config.validate().unwrap_err()),
            "dispatch.event_capacity"
        );
    }

    #[test]
    fn test_rejects_blank_marker() {
        let mut config = Config::with_endpoint("http://localhost:9000/send");
        config.endpoint.success_marker = "  ".into();
        assert_eq!(
            config_key(config.validate().unwrap_err()),
            "endpoint.success_marker"
        );
    }

    #[test]
    fn test_deserialize_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"endpoint": {"url": "https://relay.example/send", "call_timeout": 5}}"#,
        )
        .unwrap();

        assert_eq!(config.endpoint.call_timeout, Duration::from_secs(5));
        assert_eq!(config.endpoint.link_param, "link");
        assert_eq!(config.dispatch.event_capacity, 1000);
        config.validate().unwrap();
    }

    #[test]
    fn test_endpoint_defaults_match_relay_wire_format() {
        let endpoint = EndpointConfig::new("https://relay.example/send");

        assert_eq!(endpoint.link_param, "link");
        assert_eq!(endpoint.message_param, "pesan");
        assert_eq!(endpoint.count_param, "jumlah");
        assert_eq!(endpoint.probe_target, "https://ngl.link/test");
        assert_eq!(endpoint.probe_message, "test");
    }
}
