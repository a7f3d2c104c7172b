//! schools-server: HTTP CRUD service for the `schools` table
//!
//! Exposes create/list/get/update/delete over JSON, counts every
//! terminal response in a Prometheus registry, and serves a static UI.

pub mod config;
pub mod db;
pub mod http;
pub mod metrics;
pub mod models;

pub use config::DbConfig;
pub use db::{DbError, Lookup, MemoryStore, PgSchoolStore, SchoolStore};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use metrics::{HttpMetrics, NoopRecorder, RequestRecorder, Route};
pub use models::{School, SchoolInput};
