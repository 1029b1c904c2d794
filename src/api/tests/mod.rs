use super::*;
use crate::Config;
use crate::dispatcher::test_helpers::{ScriptedTransport, create_test_dispatcher};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Dispatcher over an always-accepting scripted transport, wrapped in Arc
fn create_test_app_parts() -> (Arc<Dispatcher>, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::always_accept();
    let dispatcher = Arc::new(create_test_dispatcher(transport.clone()));
    (dispatcher, transport)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("response should be valid JSON")
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (dispatcher, _transport) = create_test_app_parts();

    // Port 0 = OS assigns a free port
    let mut config = dispatcher.config().clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let dispatcher = dispatcher.clone();
        let config = config.clone();
        async move { start_api_server(dispatcher, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be serving");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (dispatcher, _transport) = create_test_app_parts();

    let mut config = dispatcher.config().clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(dispatcher, Arc::new(config));

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (dispatcher, _transport) = create_test_app_parts();

    let mut config = dispatcher.config().clone();
    config.api.cors_enabled = false;
    let app = create_router(dispatcher, Arc::new(config));

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (dispatcher, _transport) = create_test_app_parts();

    let mut config = dispatcher.config().clone();
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(dispatcher, Arc::new(config));

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_routes_are_prefixed() {
    let (dispatcher, _transport) = create_test_app_parts();
    let config = Arc::new(dispatcher.config().clone());
    let app = create_router(dispatcher, config);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (dispatcher, _transport) = create_test_app_parts();

    let mut config = dispatcher.config().clone();
    config.api.swagger_ui = true;
    let app = create_router(dispatcher, Arc::new(config));

    let response = app.oneshot(get("/swagger-ui/")).await.unwrap();

    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Swagger UI should be accessible when enabled"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();
    assert!(body_str.contains("<html") || body_str.contains("<!DOCTYPE html>"));
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (dispatcher, _transport) = create_test_app_parts();

    let mut config = dispatcher.config().clone();
    config.api.swagger_ui = false;
    let app = create_router(dispatcher, Arc::new(config));

    let response = app.oneshot(get("/swagger-ui/")).await.unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}

#[test]
fn test_default_config_routes_build() {
    let (dispatcher, _transport) = create_test_app_parts();
    let _router = create_router(dispatcher, Arc::new(Config::default()));
}
