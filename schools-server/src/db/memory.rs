//! In-process school store
//!
//! Mirrors the Postgres semantics the dispatcher relies on: ids are
//! assigned from a never-reused sequence, listing is ordered by id, and
//! setup seeds only an empty table. Used by tests and `serve --in-memory`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DbError, Lookup, SchoolStore};
use crate::models::{School, SchoolInput};

const SEED: [(&str, &str); 2] = [("Vishal", "Delhi"), ("Vivek", "Mumbai")];

#[derive(Debug)]
struct Table {
    rows: BTreeMap<i32, School>,
    // None once i32::MAX has been handed out
    next_id: Option<i32>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: Some(1),
        }
    }
}

impl Table {
    fn insert(&mut self, input: &SchoolInput) -> Result<School, DbError> {
        let id = self.next_id.ok_or(DbError::SequenceExhausted)?;
        self.next_id = id.checked_add(1);

        let school = School {
            id,
            name: input.name.clone(),
            address: input.address.clone(),
        };
        self.rows.insert(id, school.clone());
        Ok(school)
    }
}

/// School store backed by a `BTreeMap`
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the database were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DbError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn create(&self, input: &SchoolInput) -> Result<School, DbError> {
        self.check()?;
        self.table.write().await.insert(input)
    }

    async fn list(&self) -> Result<Vec<School>, DbError> {
        self.check()?;
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Lookup<School> {
        if let Err(e) = self.check() {
            return Lookup::StoreError(e);
        }
        match self.table.read().await.rows.get(&id) {
            Some(school) => Lookup::Found(school.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn update(&self, id: i32, input: &SchoolInput) -> Lookup<School> {
        if let Err(e) = self.check() {
            return Lookup::StoreError(e);
        }
        match self.table.write().await.rows.get_mut(&id) {
            Some(school) => {
                school.name = input.name.clone();
                school.address = input.address.clone();
                Lookup::Found(school.clone())
            }
            None => Lookup::NotFound,
        }
    }

    async fn delete(&self, id: i32) -> Lookup<School> {
        if let Err(e) = self.check() {
            return Lookup::StoreError(e);
        }
        match self.table.write().await.rows.remove(&id) {
            Some(school) => Lookup::Found(school),
            None => Lookup::NotFound,
        }
    }

    async fn setup(&self) -> Result<(), DbError> {
        self.check()?;
        let mut table = self.table.write().await;
        if table.rows.is_empty() {
            for (name, address) in SEED {
                table.insert(&SchoolInput::new(name, address))?;
            }
        }
        Ok(())
    }
}
