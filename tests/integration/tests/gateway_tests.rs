//! Gateway integration tests
//!
//! Drive the full router end to end over the plain-HTTP protocol surface.
//! No Redis instance is required: the backend pool is lazy and none of
//! these paths touch it.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use axum::http::Method;
use integration_tests::{
    bare_gateway, echo_with_options, get, request, test_app, test_gateway,
};
use sockjs_gateway::create_app;
use sockjs_gateway::echo::EchoApp;
use sockjs_gateway::routing::RouteOptionsPatch;
use std::sync::Arc;

// ============================================================================
// Welcome
// ============================================================================

#[tokio::test]
async fn test_welcome_at_mount_path() {
    let app = test_app();
    let response = get(&app, "/echo").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Welcome to SockJS!\n");
    assert_eq!(
        response.header("content-type"),
        Some("text/plain; charset=UTF-8")
    );
}

#[tokio::test]
async fn test_welcome_with_trailing_slash() {
    let app = test_app();
    let response = get(&app, "/echo/").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "Welcome to SockJS!\n");
}

// ============================================================================
// Info
// ============================================================================

#[tokio::test]
async fn test_info_reports_default_options() {
    let app = test_app();
    let response = get(&app, "/echo/info").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.header("content-type"),
        Some("application/json; charset=UTF-8")
    );
    assert_eq!(
        response.header("cache-control"),
        Some("no-store, no-cache, must-revalidate, max-age=0")
    );

    let body = response.json().unwrap();
    assert_eq!(body["websocket"], true);
    assert_eq!(body["origins"], serde_json::json!(["*:*"]));
    assert_eq!(body["cookie_needed"], false);
    assert!(body["entropy"].is_u64());
}

#[tokio::test]
async fn test_info_reports_declared_overrides() {
    let gateway = bare_gateway();
    gateway.attach(echo_with_options(
        "echo",
        "/echo",
        RouteOptionsPatch::empty().websocket(false).cookie_needed(true),
    ));
    let app = create_app(gateway);

    let body = get(&app, "/echo/info").await.unwrap().json().unwrap();
    assert_eq!(body["websocket"], false);
    assert_eq!(body["cookie_needed"], true);
    // Unspecified field keeps its default
    assert_eq!(body["origins"], serde_json::json!(["*:*"]));
}

#[tokio::test]
async fn test_info_entropy_varies_per_request() {
    let app = test_app();

    let a = get(&app, "/echo/info").await.unwrap().json().unwrap();
    let b = get(&app, "/echo/info").await.unwrap().json().unwrap();
    // One collision in 2^32 would be suspicious enough
    assert_ne!(a["entropy"], b["entropy"]);
}

// ============================================================================
// Iframe
// ============================================================================

#[tokio::test]
async fn test_iframe_page() {
    let app = test_app();
    let response = get(&app, "/echo/iframe.html").await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(
        response.header("content-type"),
        Some("text/html; charset=UTF-8")
    );
    assert_eq!(
        response.header("cache-control"),
        Some("public, max-age=31536000")
    );
    assert!(response.header("etag").is_some());
    assert!(response.body.contains("SockJS.bootstrap_iframe()"));
    assert!(response.body.contains("cdn.jsdelivr.net/sockjs/1/sockjs.min.js"));
}

#[tokio::test]
async fn test_iframe_versioned_client_url() {
    let app = test_app();
    let response = get(&app, "/echo/iframe-2.3.html").await.unwrap();

    assert_eq!(response.status, 200);
    assert!(response.body.contains("cdn.jsdelivr.net/sockjs/2.3/sockjs.min.js"));
}

#[tokio::test]
async fn test_iframe_empty_version_serves_default_client_url() {
    let app = test_app();
    let response = get(&app, "/echo/iframe-.html").await.unwrap();

    assert_eq!(response.status, 200);
    // A captured-but-empty version falls back to the default client
    assert!(response.body.contains("cdn.jsdelivr.net/sockjs/1/sockjs.min.js"));
}

#[tokio::test]
async fn test_iframe_conditional_request() {
    let app = test_app();
    let first = get(&app, "/echo/iframe.html").await.unwrap();
    let etag = first.header("etag").unwrap().to_string();

    let second = request(
        &app,
        Method::GET,
        "/echo/iframe.html",
        &[("if-none-match", &etag)],
    )
    .await
    .unwrap();

    assert_eq!(second.status, 304);
    assert!(second.body.is_empty());
}

// ============================================================================
// Rejections
// ============================================================================

#[tokio::test]
async fn test_unknown_mount_is_404() {
    let app = test_app();
    let response = get(&app, "/nowhere/info").await.unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.body, "Not found\n");
}

#[tokio::test]
async fn test_unknown_transport_is_404() {
    let app = test_app();
    let response = get(&app, "/echo/000/sess1/nosuch").await.unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_session_id_with_dot_is_404() {
    let app = test_app();
    let response = get(&app, "/echo/000/abc.de/websocket").await.unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_empty_server_id_is_404() {
    let app = test_app();
    let response = get(&app, "/echo//sess1/websocket").await.unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_no_applications_attached_is_404() {
    let app = create_app(bare_gateway());
    let response = get(&app, "/echo").await.unwrap();
    assert_eq!(response.status, 404);
}

// ============================================================================
// Plain-HTTP websocket transport
// ============================================================================

#[tokio::test]
async fn test_websocket_without_upgrade_is_400() {
    let app = test_app();
    let response = get(&app, "/echo/000/sess1/websocket").await.unwrap();

    assert_eq!(response.status, 400);
    assert_eq!(response.body, "Can \"Upgrade\" only to \"WebSocket\".");
}

#[tokio::test]
async fn test_websocket_non_get_is_405() {
    let app = test_app();
    let response = request(&app, Method::POST, "/echo/000/sess1/websocket", &[])
        .await
        .unwrap();

    assert_eq!(response.status, 405);
    assert_eq!(response.header("allow"), Some("GET"));
}

// ============================================================================
// Mount resolution
// ============================================================================

#[tokio::test]
async fn test_nested_mount_resolves_to_longer_prefix() {
    let gateway = bare_gateway();
    gateway.attach(Arc::new(EchoApp::new("outer", "/a")));
    gateway.attach(echo_with_options(
        "inner",
        "/a/b",
        RouteOptionsPatch::empty().websocket(false),
    ));
    let app = create_app(gateway);

    // /a/b/info belongs to the nested mount, not to /a with extras
    let inner = get(&app, "/a/b/info").await.unwrap().json().unwrap();
    assert_eq!(inner["websocket"], false);

    let outer = get(&app, "/a/info").await.unwrap().json().unwrap();
    assert_eq!(outer["websocket"], true);
}

#[tokio::test]
async fn test_percent_encoded_path_resolves() {
    let gateway = bare_gateway();
    gateway.attach(Arc::new(EchoApp::new("echo", "/my echo")));
    let app = create_app(gateway);

    let response = get(&app, "/my%20echo/info").await.unwrap();
    assert_eq!(response.status, 200);
}

// ============================================================================
// Session lifecycle (library surface)
// ============================================================================

#[tokio::test]
async fn test_begin_session_requires_declared_route() {
    let gateway = test_gateway();

    let session = gateway
        .sessions()
        .begin_session("/echo", "sess1", "000")
        .expect("declared route");
    assert_eq!(gateway.sessions().session_count(), 1);

    assert!(gateway
        .sessions()
        .begin_session("/nowhere", "sess2", "000")
        .is_err());

    gateway.sessions().end_session(&session);
    assert_eq!(gateway.sessions().session_count(), 0);
}
