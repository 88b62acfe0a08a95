//! Gateway error types
//!
//! Unified error handling for the whole gateway.

use serde::Serialize;

/// Gateway-wide error type
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No mounted application matches any prefix of the request path, or
    /// the remaining segments do not satisfy the URL grammar. Always
    /// answered by the NotFound method, never fatal.
    #[error("No route matches the requested path")]
    RouteNotFound,

    /// No attached application yielded a route during explicit session
    /// creation. The session is discarded without entering the active set.
    #[error("No application route for session at {0}")]
    SessionCreationFailed(String),

    /// Malformed native-upgrade path: wrong trailing segment, too few
    /// segments, or a non-digit server identifier.
    #[error("Invalid transport upgrade path: {0}")]
    InvalidTransportUpgrade(String),

    /// Backend (key/value or pub/sub) operation failure, propagated to the
    /// originating caller. The core performs no automatic retry.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration errors, fatal at startup only
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything unexpected
    #[error("Internal gateway error")]
    Internal(#[source] anyhow::Error),
}

impl GatewayError {
    /// Get HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            // 404 Not Found
            Self::RouteNotFound | Self::SessionCreationFailed(_) => 404,

            // 400 Bad Request
            Self::InvalidTransportUpgrade(_) => 400,

            // 500 Internal Server Error
            Self::Backend(_) | Self::Config(_) | Self::Internal(_) => 500,
        }
    }
}

/// Result alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// JSON body for error responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn from_error(error: &GatewayError) -> Self {
        let kind = match error {
            GatewayError::RouteNotFound => "route_not_found",
            GatewayError::SessionCreationFailed(_) => "session_creation_failed",
            GatewayError::InvalidTransportUpgrade(_) => "invalid_transport_upgrade",
            GatewayError::Backend(_) => "backend_error",
            GatewayError::Config(_) => "config_error",
            GatewayError::Internal(_) => "internal_error",
        };

        Self {
            error: kind.to_string(),
            message: error.to_string(),
        }
    }
}
