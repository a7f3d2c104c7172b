//! Database configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DB_HOST`: Postgres host (default: db)
//! - `DB_USER`: role name (default: user123)
//! - `DB_PASSWORD`: role password (default: password123)
//! - `DB_NAME`: database name (default: db123)
//! - `DB_PORT`: port (default: 5432)
//! - `DB_MAX_CONNECTIONS`: pool size (default: 10)
//! - `DB_TIMEOUT_SECS`: per-statement timeout (default: 5)

use std::fmt;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

const DEFAULT_HOST: &str = "db";
const DEFAULT_USER: &str = "user123";
const DEFAULT_PASSWORD: &str = "password123";
const DEFAULT_DATABASE: &str = "db123";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the schools database
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub max_connections: u32,
    /// Upper bound on a single store call
    pub timeout: Duration,
}

impl DbConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        Self {
            host: text("DB_HOST", DEFAULT_HOST),
            user: text("DB_USER", DEFAULT_USER),
            password: text("DB_PASSWORD", DEFAULT_PASSWORD),
            database: text("DB_NAME", DEFAULT_DATABASE),
            port: lookup("DB_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            timeout: Duration::from_secs(
                lookup("DB_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    /// sqlx connect options built from the individual fields.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

// Password stays out of logs.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .field("timeout", &self.timeout)
            .finish()
    }
}
