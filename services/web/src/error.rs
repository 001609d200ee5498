//! Custom error types for the web service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ModelError;

/// Failures that end a request without the handler's own response
#[derive(Error, Debug)]
pub enum AppError {
    /// The client sent something that cannot be processed
    #[error("Bad request")]
    BadRequest,

    /// The resource is missing, expired, or not the caller's to see
    #[error("Not found")]
    NotFound,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest => StatusCode::BAD_REQUEST,
            AppError::NotFound | AppError::Model(ModelError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Model(_) | AppError::Session(_) | AppError::Template(_) => {
                error!("{:?}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason).into_response()
    }
}

/// Type alias for handler results
pub type AppResult<T> = Result<T, AppError>;
