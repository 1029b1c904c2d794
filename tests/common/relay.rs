//! Mock relay endpoint and dispatcher construction

use batch_relay::{Config, Dispatcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock relay listens on
pub const RELAY_PATH: &str = "/api/send";

/// Target link used by the tests
pub const TARGET: &str = "https://ngl.link/integration";

/// Relay body that carries the success marker
pub const ACCEPTED_BODY: &str = r#"{"status":"success","message":"delivered"}"#;

/// Start a mock relay that accepts every call
pub async fn start_accepting_relay() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(RELAY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(ACCEPTED_BODY))
        .mount(&server)
        .await;
    server
}

/// Config pointing at the mock relay
pub fn relay_config(server: &MockServer) -> Config {
    Config::with_endpoint(format!("{}{}", server.uri(), RELAY_PATH))
}

/// Dispatcher talking HTTP to the mock relay
pub fn create_relay_dispatcher(server: &MockServer) -> Dispatcher {
    Dispatcher::new(relay_config(server)).expect("mock relay config should be valid")
}
