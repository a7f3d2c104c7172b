//! Postgres-backed school store
//!
//! Every operation goes through [`PgSchoolStore::execute`], which binds
//! positional parameters and enforces the per-call timeout.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use super::{DbError, Lookup, SchoolStore};
use crate::models::{School, SchoolInput};

const INSERT_SCHOOL: &str = "INSERT INTO schools (name, address) VALUES ($1, $2) RETURNING *";
const SELECT_SCHOOLS: &str = "SELECT * FROM schools ORDER BY id ASC";
const SELECT_SCHOOL: &str = "SELECT * FROM schools WHERE id = $1";
const UPDATE_SCHOOL: &str =
    "UPDATE schools SET name = $1, address = $2 WHERE id = $3 RETURNING *";
const DELETE_SCHOOL: &str = "DELETE FROM schools WHERE id = $1 RETURNING *";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS schools (\
     id SERIAL PRIMARY KEY, \
     name VARCHAR(100), \
     address VARCHAR(100))";

// Seeds only an empty table, so repeated setup never duplicates rows.
const SEED_SCHOOLS: &str = r#"
    INSERT INTO schools (name, address)
    SELECT v.name, v.address
    FROM (VALUES ('Vishal', 'Delhi'), ('Vivek', 'Mumbai')) AS v(name, address)
    WHERE NOT EXISTS (SELECT 1 FROM schools)
    RETURNING *
"#;

/// Positional statement parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Int(i32),
    Text(Option<String>),
}

/// School repository over a Postgres pool
#[derive(Clone)]
pub struct PgSchoolStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgSchoolStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run one statement with bound parameters and collect its rows.
    ///
    /// Statements that return nothing (DDL) yield an empty vector.
    pub async fn execute(&self, statement: &str, params: Vec<Param>) -> Result<Vec<School>, DbError> {
        let mut query = sqlx::query_as::<Postgres, School>(statement);
        for param in params {
            query = match param {
                Param::Int(v) => query.bind(v),
                Param::Text(v) => query.bind(v),
            };
        }

        tokio::time::timeout(self.timeout, query.fetch_all(&self.pool))
            .await
            .map_err(|_| DbError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(DbError::from)
    }
}

fn text_params(input: &SchoolInput) -> Vec<Param> {
    vec![
        Param::Text(input.name.clone()),
        Param::Text(input.address.clone()),
    ]
}

#[async_trait]
impl SchoolStore for PgSchoolStore {
    async fn create(&self, input: &SchoolInput) -> Result<School, DbError> {
        let rows = self.execute(INSERT_SCHOOL, text_params(input)).await?;
        // INSERT .. RETURNING always yields the new row
        rows.into_iter()
            .next()
            .ok_or(DbError::Sqlx(sqlx::Error::RowNotFound))
    }

    async fn list(&self) -> Result<Vec<School>, DbError> {
        self.execute(SELECT_SCHOOLS, Vec::new()).await
    }

    async fn get(&self, id: i32) -> Lookup<School> {
        Lookup::from_rows(self.execute(SELECT_SCHOOL, vec![Param::Int(id)]).await)
    }

    async fn update(&self, id: i32, input: &SchoolInput) -> Lookup<School> {
        let mut params = text_params(input);
        params.push(Param::Int(id));
        Lookup::from_rows(self.execute(UPDATE_SCHOOL, params).await)
    }

    async fn delete(&self, id: i32) -> Lookup<School> {
        Lookup::from_rows(self.execute(DELETE_SCHOOL, vec![Param::Int(id)]).await)
    }

    async fn setup(&self) -> Result<(), DbError> {
        self.execute(CREATE_TABLE, Vec::new()).await?;
        let seeded = self.execute(SEED_SCHOOLS, Vec::new()).await?;
        tracing::info!(seeded = seeded.len(), "schools table ready");
        Ok(())
    }
}
