//! Custom error types for the common library
//!
//! This module defines the infrastructure error types shared by the
//! services built on top of this crate.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database setup operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Custom error type for Redis operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The Redis URL could not be parsed or the client could not be built
    #[error("Cache configuration error: {0}")]
    Configuration(#[source] redis::RedisError),

    /// A command failed or the connection dropped
    #[error("Cache command error: {0}")]
    Command(#[source] redis::RedisError),
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
