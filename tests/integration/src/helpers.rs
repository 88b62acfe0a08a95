//! Test helpers for integration tests
//!
//! Drives the gateway router directly with `tower::ServiceExt::oneshot`,
//! so no listener or HTTP client is involved.

use anyhow::Result;
use axum::body::Body;
use axum::http::{header::HeaderMap, Method, Request, StatusCode};
use axum::Router;
use sockjs_common::ProtocolConfig;
use sockjs_coordinator::{Coordinator, RedisPool, RedisPoolConfig, SubscriberConfig};
use sockjs_gateway::echo::EchoApp;
use sockjs_gateway::routing::RouteOptionsPatch;
use sockjs_gateway::{create_app, Gateway};
use std::sync::Arc;
use tower::ServiceExt;

/// Body size limit when collecting responses
const BODY_LIMIT: usize = 1024 * 1024;

/// Gateway with the echo application mounted at `/echo`
pub fn test_gateway() -> Arc<Gateway> {
    let gateway = bare_gateway();
    gateway.attach(Arc::new(EchoApp::new("echo", "/echo")));
    gateway
}

/// Gateway with no applications attached
pub fn bare_gateway() -> Arc<Gateway> {
    let pool = RedisPool::new(RedisPoolConfig::default()).expect("pool config is static");
    let coordinator = Arc::new(Coordinator::new(
        pool,
        SubscriberConfig::default(),
        "sockjs-test:",
    ));
    Arc::new(Gateway::new(ProtocolConfig::default(), coordinator))
}

/// Echo application with declared option overrides
pub fn echo_with_options(id: &str, mount: &str, options: RouteOptionsPatch) -> Arc<EchoApp> {
    Arc::new(EchoApp::new(id, mount).with_options(options))
}

/// Collected response: status, headers, and the full body as text
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Run one GET request through the router
pub async fn get(app: &Router, path: &str) -> Result<TestResponse> {
    request(app, Method::GET, path, &[]).await
}

/// Run one request with extra headers through the router
pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::empty())?;

    let response = app.clone().oneshot(request).await?;
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT).await?;

    Ok(TestResponse {
        status: parts.status,
        headers: parts.headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Router over a fresh gateway with the echo application mounted
pub fn test_app() -> Router {
    create_app(test_gateway())
}
