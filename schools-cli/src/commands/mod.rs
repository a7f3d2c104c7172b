//! Command implementations for the schools CLI

pub mod serve;
pub mod setup;

use clap::Args;
use schools_server::DbConfig;

pub use serve::run_serve;
pub use setup::run_setup;

/// Database connection flags shared by every command
///
/// Unset flags fall back to `DbConfig::from_env` defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// Database host
    #[arg(long = "db-host", env = "DB_HOST")]
    pub host: Option<String>,

    /// Database user
    #[arg(long = "db-user", env = "DB_USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long = "db-password", env = "DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(long = "db-name", env = "DB_NAME")]
    pub database: Option<String>,

    /// Database port
    #[arg(long = "db-port", env = "DB_PORT")]
    pub port: Option<u16>,
}

impl DbArgs {
    pub fn into_config(self) -> DbConfig {
        let mut config = DbConfig::from_env();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(user) = self.user {
            config.user = user;
        }
        if let Some(password) = self.password {
            config.password = password;
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }
}
