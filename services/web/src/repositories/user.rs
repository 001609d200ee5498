//! User repository for database operations

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::bounded;
use crate::models::{ModelError, ModelResult, User, UserStore};

/// Unique constraint guarding `users.email`
const EMAIL_CONSTRAINT: &str = "users_uc_email";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

fn hash_password(password: &str) -> ModelResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ModelError::PasswordHash(e.to_string()))
}

fn verify_password(hashed_password: &str, password: &str) -> ModelResult<bool> {
    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|e| ModelError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn is_duplicate_email(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db_err| {
        db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_CONSTRAINT)
    })
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, name: &str, email: &str, password: &str) -> ModelResult<i64> {
        info!("Creating new user: {}", email);

        let hashed_password = hash_password(password)?;

        let result = bounded(
            self.query_timeout,
            sqlx::query(
                r#"
                INSERT INTO users (name, email, hashed_password, created)
                VALUES ($1, $2, $3, NOW())
                RETURNING id
                "#,
            )
            .bind(name)
            .bind(email)
            .bind(&hashed_password)
            .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => Ok(row.get("id")),
            Err(ModelError::Query(e)) if is_duplicate_email(&e) => Err(ModelError::DuplicateEmail),
            Err(e) => Err(e),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64> {
        let row = bounded(
            self.query_timeout,
            sqlx::query("SELECT id, hashed_password FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(ModelError::InvalidCredentials)?;

        let hashed_password: String = row.get("hashed_password");
        if !verify_password(&hashed_password, password)? {
            return Err(ModelError::InvalidCredentials);
        }

        Ok(row.get("id"))
    }

    async fn get(&self, id: i64) -> ModelResult<User> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, User>(
                r#"
                SELECT id, name, email, hashed_password, created
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(ModelError::NotFound)
    }

    async fn change_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> ModelResult<()> {
        info!("Changing password for user: {}", id);

        let hashed_password = bounded(
            self.query_timeout,
            sqlx::query_scalar::<_, String>("SELECT hashed_password FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(ModelError::NotFound)?;

        if !verify_password(&hashed_password, current_password)? {
            return Err(ModelError::InvalidCredentials);
        }

        let new_hash = hash_password(new_password)?;
        let result = bounded(
            self.query_timeout,
            sqlx::query("UPDATE users SET hashed_password = $1 WHERE id = $2")
                .bind(&new_hash)
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        match result.rows_affected() {
            1 => Ok(()),
            n => Err(ModelError::RowCountMismatch(n)),
        }
    }
}
