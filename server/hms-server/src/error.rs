use auth_rbac::DenyReason;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use database_layer::DatabaseError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::auth::AuthError;

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub message: String,
    /// Error type/code
    pub error_type: String,
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Body of successful deletes and other acknowledgements
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Authorization error: {message}")]
    Authorization { message: String },

    #[error("Resource not found: {resource_type}")]
    NotFound { resource_type: String },

    #[error("Resource conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 401 with the canonical body
    pub fn unauthorized() -> Self {
        Self::authentication("Unauthorized")
    }

    /// 403 with the canonical body
    pub fn forbidden() -> Self {
        Self::authorization("Forbidden")
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Database(db_err) => match db_err {
                DatabaseError::Conflict(_) => StatusCode::CONFLICT,
                DatabaseError::ForeignKeyViolation(_) | DatabaseError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                DatabaseError::ConnectionFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Database(DatabaseError::Conflict(_)) => "conflict",
            ApiError::Database(
                DatabaseError::ForeignKeyViolation(_) | DatabaseError::InvalidInput(_),
            ) => "validation_error",
            ApiError::Database(_) => "database_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Full error text with PII masked, for log fields
    pub fn log_detail(&self) -> String {
        logger_redacted::redact(&self.to_string())
    }

    /// Message safe to return to the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation { message }
            | ApiError::Authentication { message }
            | ApiError::Authorization { message }
            | ApiError::Conflict { message } => message.clone(),
            ApiError::NotFound { resource_type } => format!("{resource_type} not found"),
            ApiError::Database(db_err) => format_database_error(db_err),
            ApiError::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

/// Pretty format database errors without leaking internals
fn format_database_error(db_error: &DatabaseError) -> String {
    match db_error {
        DatabaseError::Conflict(_) => "A record with these details already exists".to_string(),
        DatabaseError::ForeignKeyViolation(field) => {
            format!("Referenced record does not exist: {field}")
        }
        DatabaseError::InvalidInput(message) => message.clone(),
        DatabaseError::ConnectionFailed(_) => "Unable to connect to the database".to_string(),
        _ => "Database operation failed".to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        // Log the error with correlation ID
        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self.log_detail(),
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                "Request rejected"
            );
        }

        let body = ApiErrorResponse {
            message: self.public_message(),
            error_type: self.error_type().to_string(),
            error_id,
            timestamp: chrono::Utc::now(),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Database(err)
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::Unauthenticated => ApiError::unauthorized(),
            DenyReason::Forbidden => ApiError::forbidden(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::authentication("Invalid email or password"),
            AuthError::InvalidToken(_) => ApiError::unauthorized(),
            AuthError::WeakPassword(message) => ApiError::validation(message),
            AuthError::TokenCreation(message) | AuthError::PasswordHash(message) => {
                ApiError::internal(message)
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denials_use_canonical_messages() {
        let unauthenticated = ApiError::from(DenyReason::Unauthenticated);
        assert_eq!(unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(unauthenticated.public_message(), "Unauthorized");

        let forbidden = ApiError::from(DenyReason::Forbidden);
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(forbidden.public_message(), "Forbidden");
    }

    #[test]
    fn store_constraint_errors_are_client_errors() {
        let conflict = ApiError::from(DatabaseError::Conflict("users_email_key".to_string()));
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let missing = ApiError::from(DatabaseError::ForeignKeyViolation("patient_id".to_string()));
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError::internal("pool exhausted at 10.0.0.3");
        assert_eq!(err.public_message(), "Internal server error");

        let logged = err.log_detail();
        assert!(!logged.contains("10.0.0.3"));
        assert!(logged.contains("pool exhausted at IP["));
    }

    #[test]
    fn logged_store_errors_mask_emails() {
        let err = ApiError::internal("lookup failed for doctor1@hospital.com");
        let logged = err.log_detail();
        assert!(!logged.contains("doctor1@hospital.com"));
        assert!(logged.contains(&logger_redacted::redact_email("doctor1@hospital.com")));
    }
}
