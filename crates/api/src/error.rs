//! Unified error handling for the API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stride_core::{DomainError, UserId};
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// A business rule rejected the request.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Rejected(domain) => Self::Domain(domain),
            other => Self::Database(other),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: &'static str,
}

impl AppError {
    /// Machine-readable error kind sent as `error`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "internal_error",
            Self::Domain(err) => err.kind(),
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Domain(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            message,
            error: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Set the Sentry user context from the authenticated caller.
pub fn set_sentry_user(user_id: UserId) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
