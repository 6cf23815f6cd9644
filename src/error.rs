// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Coarse classification of an [`AppError`], for callers that only need to
/// branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

/// Global error type for every data-model operation.
#[derive(Debug)]
pub enum AppError {
    // Malformed or constraint-violating input (bad email, duplicate unique
    // field, oversize text, self-follow).
    Validation { field: String, message: String },

    // Reference to an entity id that does not exist (or is not usable).
    NotFound { entity: &'static str, id: i64 },

    // Uniqueness or dependency conflict (e.g., duplicate follower edge).
    Conflict(String),

    // Store failure or other unexpected condition.
    InternalServerError(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    /// Name of the offending field, for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { field, message } => {
                write!(f, "validation failed on '{}': {}", field, message)
            }
            AppError::NotFound { entity, id } => write!(f, "{} {} not found", entity, id),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Lets a hosting axum application return model errors directly.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                json!({ "error": "Internal Server Error" })
            }
            AppError::Validation { field, message } => json!({
                "error": message,
                "field": field,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Unique-constraint races are mapped by the operations themselves.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::validation("body", err.to_string())
    }
}

/// Reports the first offending field (alphabetical, so the result is stable).
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.into_iter().next() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    })
                    .unwrap_or_else(|| "invalid".to_string());
                AppError::validation(field.to_string(), message)
            }
            None => AppError::validation("input", errors.to_string()),
        }
    }
}

/// True when the store rejected a write because of a UNIQUE constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}
