// Database connection management
use crate::error::{DatabaseError, DatabaseResult};
use crate::memory::InMemoryStore;
use crate::postgres::PgStore;
use crate::repository::{
    AppointmentRepository, BillingRepository, DoctorRepository, HealthCheck, PatientRepository,
    PrescriptionRepository, UserRepository,
};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Storage backend selected at deploy time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Postgres,
    #[default]
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: Backend,
    /// Connection string, required for the Postgres backend
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            url: None,
            max_connections: 20,
            min_connections: 2,
            acquire_timeout_secs: 30,
            run_migrations: true,
        }
    }
}

/// Postgres connection pool
#[derive(Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> DatabaseResult<Self> {
        let url = config.url.as_deref().ok_or_else(|| {
            DatabaseError::ConnectionFailed("database url is not configured".to_string())
        })?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> DatabaseResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Get the underlying PgPool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the pool is healthy
    pub async fn is_healthy(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Database health check failed: {}", e);
                false
            }
        }
    }

    /// Close the pool
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

/// Handles to every repository, backed by one store
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub doctors: Arc<dyn DoctorRepository>,
    pub patients: Arc<PatientRepository>,
    pub appointments: Arc<AppointmentRepository>,
    pub prescriptions: Arc<PrescriptionRepository>,
    pub billing: Arc<BillingRepository>,
    health: Arc<dyn HealthCheck>,
    backend: Backend,
}

impl fmt::Debug for Repositories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repositories")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Repositories {
    /// Open the configured backend, running migrations for Postgres when enabled
    pub async fn connect(config: &DatabaseConfig) -> DatabaseResult<Self> {
        match config.backend {
            Backend::Memory => {
                warn!("Using the in-memory store; data is lost on restart");
                Ok(Self::in_memory())
            }
            Backend::Postgres => {
                let pool = DatabasePool::new(config).await?;
                if config.run_migrations {
                    pool.migrate().await?;
                }
                Ok(Self::postgres(&pool))
            }
        }
    }

    pub fn postgres(pool: &DatabasePool) -> Self {
        let store = Arc::new(PgStore::new(pool.pool().clone()));
        Self {
            users: store.clone(),
            doctors: store.clone(),
            patients: store.clone(),
            appointments: store.clone(),
            prescriptions: store.clone(),
            billing: store.clone(),
            health: store,
            backend: Backend::Postgres,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            doctors: store.clone(),
            patients: store.clone(),
            appointments: store.clone(),
            prescriptions: store.clone(),
            billing: store.clone(),
            health: store,
            backend: Backend::Memory,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub async fn is_healthy(&self) -> bool {
        match self.health.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Store health check failed: {}", e);
                false
            }
        }
    }
}
