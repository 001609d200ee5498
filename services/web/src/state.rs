//! Application state shared across handlers

use std::sync::Arc;

use tower_sessions::SessionManagerLayer;

use crate::{
    models::{SnippetStore, UserStore},
    session::AppSessionStore,
    templates::Templates,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub snippets: Arc<dyn SnippetStore>,
    pub users: Arc<dyn UserStore>,
    pub sessions: SessionManagerLayer<AppSessionStore>,
    pub templates: Arc<Templates>,
}
