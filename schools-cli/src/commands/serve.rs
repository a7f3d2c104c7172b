//! HTTP server command

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use schools_server::db::{create_pool, MemoryStore, PgSchoolStore};
use schools_server::{run_server, SchoolStore, ServerConfig};

use super::DbArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Do not count requests or expose /metrics
    #[arg(long, env = "METRICS_DISABLED")]
    pub no_metrics: bool,

    /// Directory served for / and other unmatched paths
    #[arg(long, env = "STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    /// Do not serve static files
    #[arg(long)]
    pub no_static: bool,

    /// Keep schools in process memory instead of Postgres
    #[arg(long)]
    pub in_memory: bool,

    /// Create and seed the table before accepting requests
    #[arg(long)]
    pub setup: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_permissive: self.cors_permissive,
            metrics_enabled: !self.no_metrics,
            static_dir: (!self.no_static).then(|| self.static_dir.clone()),
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.server_config();

    let store: Arc<dyn SchoolStore> = if args.in_memory {
        tracing::info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let db = args.db.into_config();
        tracing::info!(host = %db.host, port = db.port, database = %db.database, "Using Postgres store");
        Arc::new(PgSchoolStore::new(create_pool(&db), db.timeout))
    };

    if args.setup {
        store
            .setup()
            .await
            .context("Failed to set up schools table")?;
    }

    run_server(store, config).await.context("Server error")?;

    Ok(())
}
