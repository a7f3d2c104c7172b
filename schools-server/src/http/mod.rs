//! HTTP server layer
//!
//! Axum server with:
//! - One dispatcher path shared by every CRUD handler
//! - Per-request metric recording
//! - Request tracing
//! - Graceful shutdown

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
