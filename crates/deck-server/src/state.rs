use std::sync::Arc;

use deck_core::broker::{Broker, InProcessBroker};
use deck_core::store::{MemStore, RecordStore};

/// Shared application state passed to all route handlers: the backing-store
/// and broker handles, injected explicitly (no global singletons). Opened at
/// process start, scoped per test in the test suite.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub broker: Arc<dyn Broker>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, broker: Arc<dyn Broker>) -> Self {
        Self { store, broker }
    }

    /// Fully in-process state: `MemStore` plus `InProcessBroker`.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemStore::new()), Arc::new(InProcessBroker::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_state_starts_empty() {
        let state = AppState::in_memory();
        assert!(state.store.organization("o1").await.unwrap().is_none());
    }
}
