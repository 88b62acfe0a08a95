//! Gateway server setup
//!
//! Assembles the gateway over its Redis backend and exposes it as one axum
//! application. Every request path is owned by the protocol's URL grammar,
//! so the router is a single fallback handler rather than fixed routes.

mod handler;

pub use handler::entry_handler;

use crate::echo::EchoApp;
use crate::gateway::Gateway;
use axum::Router;
use sockjs_common::{GatewayConfig, GatewayError};
use sockjs_coordinator::{Coordinator, RedisPool, SubscriberConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Build the complete application
pub fn create_app(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .fallback(entry_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Initialize the backend and assemble the gateway
///
/// Spawns the pub/sub listener, so it must run inside a tokio runtime. The
/// echo application is mounted at `/echo` as the default.
pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<Gateway>, GatewayError> {
    tracing::info!(url = %config.redis.url, "Connecting to Redis...");
    let pool =
        RedisPool::from_config(&config.redis).map_err(|e| GatewayError::Backend(e.to_string()))?;

    let subscriber_config = SubscriberConfig {
        redis_url: config.redis.url.clone(),
        ..SubscriberConfig::default()
    };
    let coordinator = Arc::new(Coordinator::new(
        pool,
        subscriber_config,
        config.protocol.key_namespace.clone(),
    ));

    let gateway = Arc::new(Gateway::new(config.protocol.clone(), coordinator));
    gateway.attach(Arc::new(EchoApp::mounted("/echo")));

    Ok(gateway)
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::Config(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Config(format!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: GatewayConfig) -> Result<(), GatewayError> {
    let addr: SocketAddr = config
        .server
        .address()
        .parse()
        .map_err(|e| GatewayError::Config(format!("Invalid listen address: {e}")))?;

    let gateway = create_gateway(&config)?;
    let app = create_app(gateway);

    run_server(app, addr).await
}
