use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::info;

use crate::{
    dao::{document_store::DocumentStore, repository::Repository},
    error::ServiceError,
};

/// Shared handle passed to every handler.
pub type SharedState = Arc<AppState>;

/// Central application state holding the injected storage handle.
///
/// Requests share nothing else: every handler resolves the store, does its
/// reads and writes, and returns.
pub struct AppState {
    store: RwLock<Option<Arc<dyn DocumentStore>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new() -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    /// State with `store` already installed.
    pub async fn with_store(store: Arc<dyn DocumentStore>) -> SharedState {
        let state = Self::new();
        state.set_store(store).await;
        state
    }

    /// Install a store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current store handle, if one is installed, regardless of degraded mode.
    pub async fn store(&self) -> Option<Arc<dyn DocumentStore>> {
        self.store.read().await.as_ref().cloned()
    }

    /// Store handle for serving a request; fails while degraded.
    pub async fn require_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Entity access layer over the current store.
    pub async fn repository(&self) -> Result<Repository, ServiceError> {
        Ok(Repository::new(self.require_store().await?))
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, logging transitions.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });

        if changed {
            info!(degraded = value, "storage availability changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::document_store::MemoryDocumentStore;

    #[tokio::test]
    async fn starts_degraded_without_store() {
        let state = AppState::new();
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn installing_store_leaves_degraded_mode() {
        let state = AppState::with_store(Arc::new(MemoryDocumentStore::new())).await;
        assert!(!state.is_degraded());
        assert!(state.require_store().await.is_ok());
    }

    #[tokio::test]
    async fn degraded_flag_blocks_requests_even_with_store() {
        let state = AppState::with_store(Arc::new(MemoryDocumentStore::new())).await;
        state.update_degraded(true);

        assert!(state.store().await.is_some());
        assert!(matches!(
            state.repository().await,
            Err(ServiceError::Degraded)
        ));
    }
}
