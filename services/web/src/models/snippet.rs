//! Snippet model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// The expiry choices offered on the create and edit forms, in days
pub const EXPIRY_OPTIONS: &[&str] = &["365", "7", "1"];

/// Snippet entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// A snippet together with its owner's display name, when it could be resolved
#[derive(Debug, Clone, Serialize)]
pub struct SnippetListing {
    pub snippet: Snippet,
    pub author: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_serializes_for_templates() {
        let now = Utc::now();
        let listing = SnippetListing {
            snippet: Snippet {
                id: 3,
                title: "Title".to_string(),
                content: "Body".to_string(),
                user_id: 5,
                created: now,
                expires: now,
            },
            author: None,
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["snippet"]["id"], 3);
        assert_eq!(value["snippet"]["title"], "Title");
        assert!(value["author"].is_null());
    }
}
