//! Typed error handling for repository and controller operations
//!
//! One error type covers the whole request path so that handlers can
//! propagate with `?` and let the single `IntoResponse` implementation
//! shape the HTTP reply.
//!
//! # Error Categories
//!
//! - [`ApiError::NotFound`]: no row matched a primary-key read/update/delete
//! - [`ApiError::Validation`]: malformed inbound payload
//! - [`ApiError::Store`]: any other persistence failure
//! - [`ApiError::AccessDenied`]: the access-control hook rejected the request
//!
//! A malformed `_filters` blob is not represented here: it is recovered
//! locally during request parsing (logged, treated as no extra filters) and
//! never surfaces to the caller.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The error type shared by repositories and resource handlers
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No row matched the primary key
    NotFound { entity: String, id: i64 },

    /// The inbound payload could not be decoded
    Validation { message: String },

    /// The persistence driver failed for any other reason
    Store { message: String },

    /// The access-control hook returned false
    AccessDenied,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound { entity, id } => write!(f, "{} {} not found", entity, id),
            ApiError::Validation { message } => write!(f, "{}", message),
            ApiError::Store { message } => write!(f, "{}", message),
            ApiError::AccessDenied => write!(f, "Access denied!"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Build a not-found error for one entity/id pair
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        ApiError::NotFound {
            entity: entity.into(),
            id,
        }
    }

    /// Build a store error from any displayable cause
    pub fn store(cause: impl fmt::Display) -> Self {
        ApiError::Store {
            message: cause.to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::AccessDenied => StatusCode::UNAUTHORIZED,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Store { .. } => "STORE_ERROR",
            ApiError::AccessDenied => "ACCESS_DENIED",
        }
    }

    /// Convert to an error response body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

/// A specialized Result type for repository and handler operations
pub type ApiResult<T> = Result<T, ApiError>;
