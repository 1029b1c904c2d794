//! REST API server example
//!
//! Runs batch-relay with the REST API enabled, allowing control via HTTP.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:6790/swagger-ui
//! - Start a run via POST http://localhost:6790/api/v1/runs
//! - Cancel it via DELETE http://localhost:6790/api/v1/runs/current
//! - Stream events via GET http://localhost:6790/api/v1/events
//!
//! Usage: `cargo run --example rest_api_server -- <relay-url>`

use batch_relay::config::{ApiConfig, Config, EndpointConfig};
use batch_relay::{Dispatcher, run_with_shutdown};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let relay = std::env::args()
        .nth(1)
        .ok_or("usage: rest_api_server <relay-url>")?;

    let config = Config {
        endpoint: EndpointConfig::new(relay),
        api: ApiConfig {
            bind_address: "127.0.0.1:6790".parse::<SocketAddr>()?,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            swagger_ui: true,
        },
        ..Default::default()
    };

    let dispatcher = Arc::new(Dispatcher::new(config)?);

    println!("🚀 Starting batch-relay REST API server");
    println!("📖 Swagger UI: http://localhost:6790/swagger-ui");
    println!("📡 API Base: http://localhost:6790/api/v1");
    println!("🔄 Events stream: http://localhost:6790/api/v1/events");
    println!();
    println!("Example commands:");
    println!("  # Start a run");
    println!("  curl -X POST http://localhost:6790/api/v1/runs \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!(
        "    -d '{{\"target\": \"https://ngl.link/someone\", \"message\": \"hi\", \"count\": 5, \"mode\": \"fast\"}}'"
    );
    println!();
    println!("  # Cancel the active run");
    println!("  curl -X DELETE http://localhost:6790/api/v1/runs/current");
    println!();
    println!("  # Stream events (Server-Sent Events)");
    println!("  curl -N http://localhost:6790/api/v1/events");

    let server = dispatcher.spawn_api_server();

    // Ctrl+C / SIGTERM cancels the active run, then the server is stopped
    run_with_shutdown((*dispatcher).clone()).await?;
    server.abort();

    Ok(())
}
