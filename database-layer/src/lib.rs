//! Persistence layer for the HMS engine
//!
//! One repository trait per entity, with two interchangeable backends:
//! - [`PgStore`]: PostgreSQL through sqlx, schema under `migrations/`
//! - [`InMemoryStore`]: process-local maps for development and tests
//!
//! [`Repositories`] bundles the handles for whichever backend the
//! [`DatabaseConfig`] selects.
//!
//! # Example Usage
//!
//! ```rust
//! use database_layer::{NewPatient, Repositories};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), database_layer::DatabaseError> {
//! let repos = Repositories::in_memory();
//! let patient = repos
//!     .patients
//!     .create(NewPatient {
//!         name: "John Smith".to_string(),
//!         phone: "+1-555-0100".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! assert_eq!(patient.id, 1);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use connection::*;
pub use error::*;
pub use memory::InMemoryStore;
pub use models::*;
pub use postgres::PgStore;
pub use repository::*;
