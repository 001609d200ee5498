//! PostgreSQL-backed implementations of the storage contracts

use std::{future::Future, time::Duration};

use crate::models::{ModelError, ModelResult};

pub mod snippet;
pub mod user;

pub use snippet::SnippetRepository;
pub use user::UserRepository;

/// Run a query under the caller's time budget
async fn bounded<T, F>(limit: Duration, query: F) -> ModelResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result.map_err(ModelError::from),
        Err(_) => Err(ModelError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_reports_timeout() {
        let limit = Duration::from_millis(10);
        let slow = async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, sqlx::Error>(1)
        };

        assert!(matches!(
            bounded(limit, slow).await,
            Err(ModelError::Timeout(d)) if d == limit
        ));
    }

    #[tokio::test]
    async fn test_bounded_maps_driver_errors() {
        let failing = async { Err::<i64, _>(sqlx::Error::RowNotFound) };

        assert!(matches!(
            bounded(Duration::from_secs(1), failing).await,
            Err(ModelError::Query(sqlx::Error::RowNotFound))
        ));
    }
}
