//! In-memory stores and shared store checks for tests

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::models::{ModelError, ModelResult, Snippet, SnippetStore, User, UserStore};

/// Force a stored snippet past its expiry
#[async_trait]
pub trait ExpiryControl {
    async fn expire(&self, id: i64);
}

#[derive(Default)]
pub struct FakeSnippets {
    rows: Mutex<Vec<Snippet>>,
    pub authors: Mutex<HashMap<i64, String>>,
    pub lose_updates: AtomicBool,
}

impl FakeSnippets {
    pub fn seed(&self, title: &str, user_id: i64, expires_days: i64) -> i64 {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        let now = Utc::now();
        rows.push(Snippet {
            id,
            title: title.to_string(),
            content: format!("{title} body"),
            user_id,
            created: now,
            expires: now + Duration::days(expires_days),
        });
        id
    }

    pub fn row(&self, id: i64) -> Option<Snippet> {
        self.rows.lock().unwrap().iter().find(|s| s.id == id).cloned()
    }
}

#[async_trait]
impl ExpiryControl for FakeSnippets {
    async fn expire(&self, id: i64) {
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|s| s.id == id) {
            row.expires = Utc::now() - Duration::seconds(1);
        }
    }
}

#[async_trait]
impl SnippetStore for FakeSnippets {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
        user_id: i64,
    ) -> ModelResult<i64> {
        let id = self.seed(title, user_id, expires_days.into());
        if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|s| s.id == id) {
            row.content = content.to_string();
        }
        Ok(id)
    }

    async fn get(&self, id: i64) -> ModelResult<Snippet> {
        self.row(id)
            .filter(|s| s.expires > Utc::now())
            .ok_or(ModelError::NotFound)
    }

    async fn latest(&self) -> ModelResult<Vec<Snippet>> {
        let now = Utc::now();
        let mut live: Vec<Snippet> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.expires > now)
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        live.truncate(10);
        Ok(live)
    }

    async fn update(
        &self,
        title: &str,
        content: &str,
        expires_days: i32,
        id: i64,
    ) -> ModelResult<()> {
        if self.lose_updates.load(Ordering::SeqCst) {
            return Err(ModelError::RowCountMismatch(0));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ModelError::RowCountMismatch(0))?;
        row.title = title.to_string();
        row.content = content.to_string();
        row.expires = Utc::now() + Duration::days(expires_days.into());
        Ok(())
    }

    async fn delete(&self, id: i64) -> ModelResult<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|s| s.id != id);
        Ok((before - rows.len()) as u64)
    }

    async fn get_author(&self, user_id: i64) -> ModelResult<String> {
        self.authors
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or(ModelError::NotFound)
    }
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct FakeUsers {
    accounts: Mutex<Vec<Account>>,
}

impl FakeUsers {
    pub fn seed(&self, name: &str, email: &str, password: &str) -> i64 {
        let id = self.accounts.lock().unwrap().len() as i64 + 1;
        self.seed_with_id(id, name, email, password);
        id
    }

    pub fn seed_with_id(&self, id: i64, name: &str, email: &str, password: &str) {
        self.accounts.lock().unwrap().push(Account {
            user: User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                hashed_password: String::new(),
                created: Utc::now(),
            },
            password: password.to_string(),
        });
    }

    pub fn remove(&self, id: i64) {
        self.accounts.lock().unwrap().retain(|a| a.user.id != id);
    }

    pub fn password_of(&self, id: i64) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.password.clone())
    }
}

#[async_trait]
impl UserStore for FakeUsers {
    async fn insert(&self, name: &str, email: &str, password: &str) -> ModelResult<i64> {
        let taken = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.user.email == email);
        if taken {
            return Err(ModelError::DuplicateEmail);
        }
        Ok(self.seed(name, email, password))
    }

    async fn authenticate(&self, email: &str, password: &str) -> ModelResult<i64> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user.email == email && a.password == password)
            .map(|a| a.user.id)
            .ok_or(ModelError::InvalidCredentials)
    }

    async fn get(&self, id: i64) -> ModelResult<User> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
            .ok_or(ModelError::NotFound)
    }

    async fn change_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> ModelResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.user.id == id)
            .ok_or(ModelError::NotFound)?;
        if account.password != current_password {
            return Err(ModelError::InvalidCredentials);
        }
        account.password = new_password.to_string();
        Ok(())
    }
}

/// Behaviour every [`SnippetStore`] must share, whatever it is backed by
pub async fn check_snippet_store_contract<S>(store: &S)
where
    S: SnippetStore + ExpiryControl,
{
    for days in [1, 7, 365] {
        let id = store.insert("Title", "Body", days, 5).await.unwrap();
        let snippet = store.get(id).await.unwrap();

        assert_eq!(snippet.id, id);
        assert_eq!(snippet.title, "Title");
        assert_eq!(snippet.content, "Body");
        assert_eq!(snippet.user_id, 5);
        assert_eq!(snippet.expires - snippet.created, Duration::days(days.into()));
    }

    let id = store.insert("Old", "Body", 1, 1).await.unwrap();
    store.expire(id).await;
    assert!(matches!(store.get(id).await, Err(ModelError::NotFound)));
    assert!(matches!(store.get(i64::MAX).await, Err(ModelError::NotFound)));

    let mut newest = 0;
    for n in 0..12 {
        newest = store.insert(&format!("Row {n}"), "Body", 7, 1).await.unwrap();
    }
    store.expire(newest).await;
    let latest = store.latest().await.unwrap();
    assert_eq!(latest.len(), 10);
    assert!(latest.windows(2).all(|w| w[0].created >= w[1].created));
    assert!(latest.iter().all(|s| s.expires > s.created && s.id != newest));

    assert!(matches!(
        store.update("Title", "Body", 1, i64::MAX).await,
        Err(ModelError::RowCountMismatch(0))
    ));

    let id = store.insert("Before", "Body", 365, 1).await.unwrap();
    store.update("After", "New body", 1, id).await.unwrap();
    let snippet = store.get(id).await.unwrap();
    assert_eq!(snippet.title, "After");
    assert_eq!(snippet.content, "New body");
    assert!(snippet.expires > Utc::now());
    assert!(snippet.expires < Utc::now() + Duration::days(2));

    assert_eq!(store.delete(id).await.unwrap(), 1);
    assert_eq!(store.delete(id).await.unwrap(), 0);
    assert!(matches!(store.get(id).await, Err(ModelError::NotFound)));
}

#[tokio::test]
async fn test_fake_snippets_honour_store_contract() {
    check_snippet_store_contract(&FakeSnippets::default()).await;
}
