//! SockJS gateway server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p sockjs-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use sockjs_common::{try_init_tracing, GatewayConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Gateway failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting SockJS gateway...");

    let config = GatewayConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.env,
        address = %config.server.address(),
        namespace = %config.protocol.key_namespace,
        "Configuration loaded"
    );

    sockjs_gateway::run(config).await?;

    Ok(())
}
