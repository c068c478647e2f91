//! API request handlers.

/// Configuration reload handler.
pub mod config;
/// Health check handler.
pub mod health;
/// Research query handlers, blocking and streaming.
pub mod query;
/// Worker listing handler.
pub mod workers;
