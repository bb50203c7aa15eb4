use std::sync::Arc;

use crate::domain::cards::CardCatalog;
use crate::engine::GameEngine;
use crate::store::SessionStore;
use crate::ws::hub::ConnectionHub;

/// Shared application state handed to every route and session.
#[derive(Clone)]
pub struct AppState {
    store: SessionStore,
    hub: Arc<ConnectionHub>,
    engine: GameEngine,
}

impl AppState {
    pub fn new() -> Self {
        let store = SessionStore::new();
        let hub = Arc::new(ConnectionHub::new());
        let engine = GameEngine::new(store.clone(), CardCatalog::builtin(), Arc::clone(&hub));
        Self { store, hub, engine }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
