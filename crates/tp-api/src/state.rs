//! Shared application state for the Axum server.

use std::sync::Arc;

use tp_ai::ProviderManager;

use crate::store::TaskStore;

/// Shared application state, cheap to clone into every handler.
#[derive(Clone)]
pub struct AppState {
    /// In-memory task store.
    pub tasks: TaskStore,
    /// Natural-language provider manager.
    pub ai: Arc<ProviderManager>,
}

impl AppState {
    /// Empty store around an already configured provider manager.
    pub fn new(ai: Arc<ProviderManager>) -> Self {
        Self {
            tasks: TaskStore::new(),
            ai,
        }
    }
}

impl Default for AppState {
    /// Rule-based parsing only, for tests and offline development.
    fn default() -> Self {
        Self::new(Arc::new(ProviderManager::new()))
    }
}
