//! Postgres backend built on sqlx
//!
//! Queries use the runtime-checked `query_as` API so the crate builds without
//! a live database.

mod appointments;
mod billing;
mod doctors;
mod patients;
mod prescriptions;
mod users;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{error::DatabaseResult, repository::HealthCheck};

/// Every repository backed by one connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> DatabaseResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
