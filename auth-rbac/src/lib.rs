//! Role-based authorization core for the HMS engine
//!
//! Every API route asks this crate one question: may this caller perform this
//! operation on this resource? The answer comes from two sources:
//! - a static capability table keyed by `(role, resource type, operation)`
//! - an ownership rule for doctors, resolved through an [`OwnershipResolver`]
//!
//! The crate has no HTTP or database dependency. Callers translate a
//! [`Decision`] into their own transport errors.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use auth_rbac::{
//!     AuthorizationEngine, Decision, Identity, InMemoryOwnershipResolver, Operation,
//!     ResourceRef, ResourceType, Role,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let resolver = InMemoryOwnershipResolver::new();
//! resolver.link("doctor1@hospital.com", 7);
//!
//! let engine = AuthorizationEngine::new(Arc::new(resolver));
//! let doctor = Identity::new(2, "doctor1@hospital.com", Role::Doctor, "Dr. One");
//!
//! let decision = engine
//!     .authorize(
//!         Some(&doctor),
//!         Operation::Update,
//!         ResourceType::Appointment,
//!         Some(&ResourceRef::Appointment { id: 42, doctor_id: 7 }),
//!     )
//!     .await;
//!
//! assert_eq!(decision, Decision::Allowed);
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod models;
pub mod resolver;
pub mod schema;

pub use engine::*;
pub use error::*;
pub use models::*;
pub use resolver::*;
pub use schema::*;
