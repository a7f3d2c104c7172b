//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Static UI fallback
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::SchoolStore;
use crate::metrics::{HttpMetrics, NoopRecorder, RequestRecorder};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:3000)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    pub cors_permissive: bool,

    /// Count requests and expose `/metrics` (default: true)
    pub metrics_enabled: bool,

    /// Directory served for `/` and unmatched paths (default: ./public)
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_permissive: false,
            metrics_enabled: true,
            static_dir: Some(PathBuf::from("public")),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn SchoolStore>,
    pub recorder: Arc<dyn RequestRecorder>,
}

/// Build the application router.
///
/// With `metrics` set every CRUD response is counted and `/metrics` is
/// routed; without it a [`NoopRecorder`] takes its place.
pub fn build_router(
    store: Arc<dyn SchoolStore>,
    metrics: Option<Arc<HttpMetrics>>,
    config: &ServerConfig,
) -> Router {
    let recorder = match &metrics {
        Some(metrics) => Arc::clone(metrics) as Arc<dyn RequestRecorder>,
        None => Arc::new(NoopRecorder) as Arc<dyn RequestRecorder>,
    };
    let state = Arc::new(AppState { store, recorder });

    let mut app = Router::new()
        .merge(routes::health::router())
        .merge(routes::schools::router())
        .merge(routes::setup::router())
        .with_state(state);

    if let Some(metrics) = metrics {
        app = app.merge(routes::metrics::router(metrics));
    }

    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors_layer(config.cors_permissive))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
///
/// # Example
///
/// ```ignore
/// let config = DbConfig::from_env();
/// let store = Arc::new(PgSchoolStore::new(create_pool(&config), config.timeout));
/// run_server(store, ServerConfig::default()).await?;
/// ```
pub async fn run_server(
    store: Arc<dyn SchoolStore>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let metrics = if config.metrics_enabled {
        Some(Arc::new(HttpMetrics::new()?))
    } else {
        tracing::info!("Request metrics disabled");
        None
    };

    let app = build_router(store, metrics, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}
