//! Repository layer for database operations
//!
//! This module provides CRUD operations for all entities. Reads and single
//! writes go straight to the pool; compound writes (a goal plus its state
//! row, flag toggles) run inside one transaction.

mod adhoc;
mod flags;
mod goals;
mod logs;
mod sessions;
mod states;

use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}
