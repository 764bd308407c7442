//! Credential verification, session tokens and the doctor ownership link

pub mod ownership;
pub mod password;
pub mod tokens;

pub use ownership::RepositoryOwnershipResolver;
pub use password::PasswordService;
pub use tokens::{IssuedToken, TokenClaims, TokenService};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Failed to create token: {0}")]
    TokenCreation(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}
