use axum::{extract::rejection::JsonRejection, Json};

use crate::error::ApiError;

/// Turn a JSON body extraction into a 400 with the parser's message
///
/// Handlers take `Result<Json<T>, JsonRejection>` and call this after the
/// authorization check, so an unauthenticated caller gets 401 rather than a
/// body error.
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}
