//! Integration test utilities for the SockJS gateway
//!
//! Builds an in-process gateway over a lazy Redis pool; the plain-HTTP
//! surface (welcome, info, iframe, rejections) opens no backend
//! connection, so these tests need no running Redis.

pub mod helpers;

pub use helpers::*;
