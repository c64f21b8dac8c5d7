//! Application state shared across handlers

use std::sync::Arc;

use agora_db::Database;
use agora_services::{ChatCompletionService, ConnectionManager, ObjectStorage};

/// Shared application state.
///
/// Chat and storage are optional: routes that need a missing service
/// answer 503 instead of failing at startup.
pub struct AppState {
    pub db: Database,
    pub chat: Option<Arc<dyn ChatCompletionService>>,
    pub storage: Option<Arc<dyn ObjectStorage>>,
    pub ws: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            chat: None,
            storage: None,
            ws: Arc::new(ConnectionManager::new()),
        }
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatCompletionService>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }
}
