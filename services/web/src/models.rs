//! Domain models and the storage contracts the handlers depend on

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod snippet;
pub mod user;

pub use snippet::{Snippet, SnippetListing};
pub use user::User;

/// Failures reported by the storage layer
///
/// The first four variants are domain outcomes that handlers match on; the
/// rest are infrastructure faults.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The row is absent or its snippet has expired
    #[error("no matching record found")]
    NotFound,

    /// `users.email` already holds this address
    #[error("duplicate email")]
    DuplicateEmail,

    /// Unknown email or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A write addressed a single row but touched a different number of rows
    #[error("expected exactly one affected row, got {0}")]
    RowCountMismatch(u64),

    #[error("storage call exceeded {0:?}")]
    Timeout(Duration),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Expiry-aware snippet storage
#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Store a snippet that expires `expires_days` after now; returns its id
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
        user_id: i64,
    ) -> ModelResult<i64>;

    /// Fetch a snippet that has not expired yet
    async fn get(&self, id: i64) -> ModelResult<Snippet>;

    /// Up to ten live snippets, newest first
    async fn latest(&self) -> ModelResult<Vec<Snippet>>;

    /// Overwrite a snippet and restart its expiry window from now
    async fn update(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
        id: i64,
    ) -> ModelResult<()>;

    /// Remove a snippet, returning the number of rows deleted
    async fn delete(&self, id: i64) -> ModelResult<u64>;

    /// Display name of a snippet's owner
    async fn get_author(&self, user_id: i64) -> ModelResult<String>;
}

/// User accounts and credentials
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, name: &str, email: &str, password: &str) -> ModelResult<i64>;

    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64>;

    async fn get(&self, id: i64) -> ModelResult<User>;

    async fn change_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> ModelResult<()>;
}
