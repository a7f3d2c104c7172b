//! Schema bootstrap command

use anyhow::{Context, Result};
use clap::Parser;
use schools_server::db::{create_pool, PgSchoolStore};
use schools_server::SchoolStore;

use super::DbArgs;

/// Arguments for the setup command
#[derive(Parser, Debug)]
pub struct SetupArgs {
    #[command(flatten)]
    pub db: DbArgs,
}

/// Create the schools table and seed it when empty
pub async fn run_setup(args: SetupArgs) -> Result<()> {
    let config = args.db.into_config();
    tracing::info!(host = %config.host, database = %config.database, "Preparing schools table");

    let store = PgSchoolStore::new(create_pool(&config), config.timeout);
    store
        .setup()
        .await
        .context("Failed to set up schools table")?;

    println!("Table ready with some data");
    Ok(())
}
