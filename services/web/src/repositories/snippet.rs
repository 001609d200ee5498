//! Snippet repository for database operations
//!
//! Every timestamp is computed by PostgreSQL (`NOW()`), never by the
//! application, so expiry checks and expiry arithmetic share one clock.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::debug;

use super::bounded;
use crate::models::{ModelError, ModelResult, Snippet, SnippetStore};

/// Snippet repository
#[derive(Clone)]
pub struct SnippetRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl SnippetRepository {
    /// Create a new snippet repository
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl SnippetStore for SnippetRepository {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
        user_id: i64,
    ) -> ModelResult<i64> {
        debug!(
            "Inserting snippet for user {} expiring in {} days",
            user_id, expires_days
        );

        let row = bounded(
            self.query_timeout,
            sqlx::query(
                r#"
                INSERT INTO snippets (title, content, user_id, created, expires)
                VALUES ($1, $2, $3, NOW(), NOW() + make_interval(days => $4))
                RETURNING id
                "#,
            )
            .bind(title)
            .bind(content)
            .bind(user_id)
            .bind(expires_days)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(row.get("id"))
    }

    async fn get(&self, id: i64) -> ModelResult<Snippet> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, Snippet>(
                r#"
                SELECT id, title, content, user_id, created, expires
                FROM snippets
                WHERE expires > NOW() AND id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(ModelError::NotFound)
    }

    async fn latest(&self) -> ModelResult<Vec<Snippet>> {
        bounded(
            self.query_timeout,
            sqlx::query_as::<_, Snippet>(
                r#"
                SELECT id, title, content, user_id, created, expires
                FROM snippets
                WHERE expires > NOW()
                ORDER BY created DESC
                LIMIT 10
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn update(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
        id: i64,
    ) -> ModelResult<()> {
        let result = bounded(
            self.query_timeout,
            sqlx::query(
                r#"
                UPDATE snippets
                SET title = $1, content = $2, expires = NOW() + make_interval(days => $3)
                WHERE id = $4
                "#,
            )
            .bind(title)
            .bind(content)
            .bind(expires_days)
            .bind(id)
            .execute(&self.pool),
        )
        .await?;

        match result.rows_affected() {
            1 => Ok(()),
            n => Err(ModelError::RowCountMismatch(n)),
        }
    }

    async fn delete(&self, id: i64) -> ModelResult<u64> {
        let result = bounded(
            self.query_timeout,
            sqlx::query("DELETE FROM snippets WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_author(&self, user_id: i64) -> ModelResult<String> {
        bounded(
            self.query_timeout,
            sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(ModelError::NotFound)
    }
}
