//! Turning axum extractor rejections into JSON validation errors.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` (and the same for `Query`
//! and `Path`) and unwrap it through these helpers so a malformed request
//! gets the usual `{message, error}` body instead of axum's plain text.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use stride_core::DomainError;

use crate::error::AppError;

/// Unwrap a JSON body.
///
/// # Errors
///
/// Returns a validation error carrying the rejection text.
pub fn json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        DomainError::Validation(format!("Invalid request body: {}", rejection.body_text())).into()
    })
}

/// Unwrap query parameters.
///
/// # Errors
///
/// Returns a validation error carrying the rejection text.
pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params.map(|Query(value)| value).map_err(|rejection| {
        DomainError::Validation(format!("Invalid query: {}", rejection.body_text())).into()
    })
}

/// Unwrap a path parameter, reporting `message` on failure.
///
/// # Errors
///
/// Returns a validation error with `message`.
pub fn path<T>(param: Result<Path<T>, PathRejection>, message: &str) -> Result<T, AppError> {
    param.map(|Path(value)| value).map_err(|rejection| {
        tracing::debug!(rejection = %rejection.body_text(), "Rejected path parameter");
        DomainError::validation(message).into()
    })
}
