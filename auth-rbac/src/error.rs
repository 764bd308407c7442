use thiserror::Error;

use crate::models::{Operation, ResourceType, Role};

/// Failure of the doctor-ownership lookup.
///
/// The engine never surfaces these to callers; any of them turns into a
/// `Forbidden` decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Ownership store error: {0}")]
    Store(String),

    #[error("Ownership is ambiguous: {0}")]
    Ambiguous(String),
}

/// Errors raised while building a capability table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RbacError {
    #[error("Missing capability rule for {role} {operation} {resource}")]
    MissingRule {
        role: Role,
        resource: ResourceType,
        operation: Operation,
    },

    #[error("Owner rules are not supported for {role} {operation} {resource}")]
    UnsupportedOwnerRule {
        role: Role,
        resource: ResourceType,
        operation: Operation,
    },

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

pub type RbacResult<T> = std::result::Result<T, RbacError>;
