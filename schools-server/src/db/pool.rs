//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits. The pool is created
//! lazily: nothing touches the network until the first statement runs.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DbConfig;

/// Create a lazily-connecting PostgreSQL pool.
///
/// Acquiring a connection waits at most `config.timeout`.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DbConfig::from_env());
/// ```
pub fn create_pool(config: &DbConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.timeout)
        .connect_lazy_with(config.connect_options())
}
