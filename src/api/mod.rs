//! HTTP API Handlers and Routes
//!
//! The REST layer, built on axum.
//!
//! # API Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/config/reload` - Re-read the config file
//! - `GET /api/workers` - Worker descriptors
//! - `POST /api/query` - Run a query and return the final answer
//! - `POST /api/query/stream` - Run a query with Server-Sent Events progress
//! - `GET /api/openapi.json` - OpenAPI document

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
