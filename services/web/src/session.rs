//! Session stores and layer for `tower-sessions`
//!
//! Records are JSON-encoded under `session:<id>` in Redis, with the key TTL
//! set to the record's expiry, or kept in a process-local map that a
//! background sweep keeps free of expired records.

use async_trait::async_trait;
use common::cache::RedisPool;
use std::{collections::HashMap, sync::Arc, time::Duration};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_sessions::{
    Expiry, Session, SessionManagerLayer,
    cookie::SameSite,
    session::{Id, Record},
    session_store::{self, ExpiredDeletion, SessionStore},
};
use tracing::{debug, warn};

use crate::config::AppConfig;

/// Key of the logged-in user's id
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
/// Key of the one-shot notification shown on the next page
pub const FLASH: &str = "flash";
/// Key of the path to resume after logging in
pub const REDIRECT_PATH_AFTER_LOGIN: &str = "redirectPathAfterLogin";

pub type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Read a string and clear it in the same step
///
/// The session is only marked modified when the key was present.
pub async fn pop_string(session: &Session, key: &str) -> SessionResult<Option<String>> {
    if session.get::<String>(key).await?.is_none() {
        return Ok(None);
    }
    session.remove::<String>(key).await
}

fn is_active(record: &Record) -> bool {
    record.expiry_date > OffsetDateTime::now_utc()
}

/// Redis-backed records, evicted by the key TTL
#[derive(Debug, Clone)]
pub struct RedisSessionStore {
    pool: RedisPool,
}

impl RedisSessionStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(id: &Id) -> String {
        format!("session:{}", id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let ttl = (record.expiry_date - OffsetDateTime::now_utc()).whole_seconds();
        if ttl <= 0 {
            return self.delete(&record.id).await;
        }

        let raw = serde_json::to_string(record)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;
        self.pool
            .set(&Self::key(&record.id), &raw, Some(ttl as u64))
            .await
            .map_err(|e| session_store::Error::Backend(e.to_string()))
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        let raw = self
            .pool
            .get(&Self::key(id))
            .await
            .map_err(|e| session_store::Error::Backend(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str::<Record>(&raw) {
            Ok(record) => Ok(Some(record).filter(is_active)),
            Err(e) => {
                warn!("Discarding undecodable session record: {}", e);
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.pool
            .delete(&Self::key(id))
            .await
            .map_err(|e| session_store::Error::Backend(e.to_string()))
    }
}

/// Process-local records for single-instance deployments and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl MemorySessionStore {
    /// Number of records currently held, expired ones included
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Purge expired records every `period` until the task is dropped
    pub async fn sweep_expired(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(e) = self.delete_expired().await {
                warn!("Session sweep failed: {}", e);
            }
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .records
            .lock()
            .await
            .get(id)
            .filter(|record| is_active(record))
            .cloned())
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for MemorySessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| is_active(record));
        debug!("Purged {} expired sessions", before - records.len());
        Ok(())
    }
}

/// The configured backend
#[derive(Debug, Clone)]
pub enum AppSessionStore {
    Redis(RedisSessionStore),
    Memory(MemorySessionStore),
}

#[async_trait]
impl SessionStore for AppSessionStore {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            AppSessionStore::Redis(store) => store.save(record).await,
            AppSessionStore::Memory(store) => store.save(record).await,
        }
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            AppSessionStore::Redis(store) => store.load(id).await,
            AppSessionStore::Memory(store) => store.load(id).await,
        }
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        match self {
            AppSessionStore::Redis(store) => store.delete(id).await,
            AppSessionStore::Memory(store) => store.delete(id).await,
        }
    }
}

/// Cookie and expiry settings for the session middleware
pub fn session_layer(
    store: AppSessionStore,
    config: &AppConfig,
) -> SessionManagerLayer<AppSessionStore> {
    let lifetime = time::Duration::seconds(config.session_lifetime_secs as i64);

    SessionManagerLayer::new(store)
        .with_name(config.session_cookie_name.clone())
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(config.secure_cookies)
        .with_expiry(Expiry::OnInactivity(lifetime))
}
