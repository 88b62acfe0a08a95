//! Error types

mod gateway_error;

pub use gateway_error::{ErrorResponse, GatewayError, GatewayResult};
