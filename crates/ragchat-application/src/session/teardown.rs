use ragchat_core::{RagService, StoreId};
use std::sync::{Arc, RwLock};

/// Shared view of which store is active, readable from outside the session.
///
/// The session manager writes it; the unload guard takes from it on exit.
#[derive(Debug, Clone, Default)]
pub struct ActiveStoreSlot(Arc<RwLock<Option<StoreId>>>);

impl ActiveStoreSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<StoreId> {
        self.0
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, store: StoreId) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(store);
    }

    /// Removes and returns the active store, leaving the slot empty.
    pub fn take(&self) -> Option<StoreId> {
        self.0
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn clear(&self) {
        self.take();
    }
}

/// Deletes `store` in a background task that nobody awaits.
///
/// Failures are logged and dropped. Without a tokio runtime the delete is
/// skipped and the store is left to expire remotely.
pub fn spawn_detached_delete(service: Arc<dyn RagService>, store: StoreId) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!(store = %store, "No async runtime available, skipping store deletion");
        return;
    };

    tracing::debug!(store = %store, "Scheduling background store deletion");
    runtime.spawn(async move {
        match service.delete_store(&store, true).await {
            Ok(()) => tracing::info!(store = %store, "Deleted RAG store in background"),
            Err(err) => {
                tracing::error!(
                    store = %store,
                    error = %err,
                    "Failed to delete RAG store in background"
                )
            }
        }
    });
}
