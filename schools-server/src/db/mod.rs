//! Data store gateway - connection pool and school stores
//!
//! # Design Principles
//!
//! - Lazy connection pool; refusal surfaces on the next statement
//! - Parameters are always bound, never interpolated
//! - Every store call is bounded by a timeout
//! - Id-scoped calls return `Lookup`, so "no row" is never an error

pub mod memory;
pub mod pool;
pub mod schools;

use async_trait::async_trait;

use crate::models::{School, SchoolInput};

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use schools::{Param, PgSchoolStore};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("statement timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("id sequence exhausted")]
    SequenceExhausted,
}

/// Result of an id-scoped statement.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    StoreError(DbError),
}

impl<T> Lookup<T> {
    /// Classify the rows of an id-scoped statement: first row or nothing.
    pub fn from_rows(rows: Result<Vec<T>, DbError>) -> Self {
        match rows {
            Ok(rows) => rows.into_iter().next().map_or(Self::NotFound, Self::Found),
            Err(e) => Self::StoreError(e),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Access to the schools table
#[async_trait]
pub trait SchoolStore: Send + Sync {
    /// Insert a row; the store assigns the id.
    async fn create(&self, input: &SchoolInput) -> Result<School, DbError>;

    /// All rows ordered by ascending id.
    async fn list(&self) -> Result<Vec<School>, DbError>;

    async fn get(&self, id: i32) -> Lookup<School>;

    /// Replace name and address; the id never changes.
    async fn update(&self, id: i32, input: &SchoolInput) -> Lookup<School>;

    /// Remove a row, returning its last state.
    async fn delete(&self, id: i32) -> Lookup<School>;

    /// Create the table if missing and seed it when empty.
    async fn setup(&self) -> Result<(), DbError>;
}
