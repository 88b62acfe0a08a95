//! Gateway configuration structs
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub env: Environment,
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub protocol: ProtocolConfig,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Redis backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// SockJS protocol tunables
///
/// Field defaults follow the reference protocol recommendations: a 25s
/// heartbeat, a one-hour dead-session timeout, and a 128 KiB streaming
/// response limit before the client is asked to reconnect.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    /// Label for the backend this gateway binds; carried for protocol
    /// surface compatibility, the single configured Redis backend is always
    /// used
    #[serde(default)]
    pub backend_name: String,
    /// Prefix applied to every coordinator key and channel
    #[serde(default = "default_key_namespace")]
    pub key_namespace: String,
    /// Delay before flushing batched frames, in seconds (fractional)
    #[serde(default = "default_batch_delay")]
    pub batch_delay: f64,
    /// Heartbeat interval in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: f64,
    /// Backend-enforced expiry for sessions no transport has serviced
    #[serde(default = "default_dead_session_timeout")]
    pub dead_session_timeout_secs: u64,
    /// Streaming responses are recycled past this many bytes
    #[serde(default = "default_max_buffered_response_size")]
    pub max_buffered_response_size: usize,
    /// Network read timeout in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Network write timeout in seconds
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
}

impl ProtocolConfig {
    #[must_use]
    pub fn dead_session_timeout(&self) -> Duration {
        Duration::from_secs(self.dead_session_timeout_secs)
    }

    #[must_use]
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs_f64(self.heartbeat_interval)
    }

    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        Duration::from_secs_f64(self.batch_delay)
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            backend_name: String::new(),
            key_namespace: default_key_namespace(),
            batch_delay: default_batch_delay(),
            heartbeat_interval: default_heartbeat_interval(),
            dead_session_timeout_secs: default_dead_session_timeout(),
            max_buffered_response_size: default_max_buffered_response_size(),
            read_timeout_secs: default_read_timeout(),
            write_timeout_secs: default_write_timeout(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_key_namespace() -> String {
    "sockjs:".to_string()
}

fn default_batch_delay() -> f64 {
    0.05
}

fn default_heartbeat_interval() -> f64 {
    25.0
}

fn default_dead_session_timeout() -> u64 {
    3600 // 1 hour
}

fn default_max_buffered_response_size() -> usize {
    128 * 1024
}

fn default_read_timeout() -> u64 {
    7200 // 2 hours
}

fn default_write_timeout() -> u64 {
    120
}

impl GatewayConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            env: env::var("APP_ENV")
                .ok()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "production" => Some(Environment::Production),
                    "staging" => Some(Environment::Staging),
                    "development" => Some(Environment::Development),
                    _ => None,
                })
                .unwrap_or_default(),
            server: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("GATEWAY_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL"))?,
                max_connections: env::var("REDIS_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_redis_max_connections),
            },
            protocol: ProtocolConfig {
                backend_name: env::var("SOCKJS_BACKEND_NAME").unwrap_or_default(),
                key_namespace: env::var("SOCKJS_KEY_NAMESPACE")
                    .unwrap_or_else(|_| default_key_namespace()),
                batch_delay: env::var("SOCKJS_BATCH_DELAY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_batch_delay),
                heartbeat_interval: env::var("SOCKJS_HEARTBEAT_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_heartbeat_interval),
                dead_session_timeout_secs: env::var("SOCKJS_DEAD_SESSION_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_dead_session_timeout),
                max_buffered_response_size: env::var("SOCKJS_MAX_BUFFERED_RESPONSE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_buffered_response_size),
                read_timeout_secs: env::var("SOCKJS_READ_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_read_timeout),
                write_timeout_secs: env::var("SOCKJS_WRITE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_write_timeout),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
