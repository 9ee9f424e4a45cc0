use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{document_store::DocumentStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the document store and keep watching it for the lifetime of the process.
///
/// Requests are refused with a degraded status whenever the store is missing
/// or failing its health probe.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DocumentStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established");
                delay = INITIAL_DELAY;

                watch(&state, store.as_ref()).await;
                warn!("storage lost; establishing a new connection");
            }
            Err(err) => warn!(error = %err, "storage connection attempt failed"),
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Poll the store until it fails and cannot be recovered in place.
async fn watch(state: &SharedState, store: &dyn DocumentStore) {
    loop {
        match store.health_check().await {
            Ok(()) => state.update_degraded(false),
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, store).await {
                    return;
                }
                state.update_degraded(false);
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Bounded in-place reconnection; degraded mode starts at the first failed attempt.
async fn reconnect(state: &SharedState, store: &dyn DocumentStore) -> bool {
    let mut retry_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnected");
                return true;
            }
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                state.update_degraded(true);
                sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_DELAY);
            }
        }
    }

    warn!("exhausted storage reconnect attempts; staying in degraded mode");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::document_store::MemoryDocumentStore, state::AppState};

    async fn settle() {
        sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn successful_connection_leaves_degraded_mode() {
        let state = AppState::new();
        let store = MemoryDocumentStore::new();

        let task = tokio::spawn(run(state.clone(), move || {
            let store: Arc<dyn DocumentStore> = Arc::new(store.clone());
            async move { Ok::<_, StorageError>(store) }
        }));
        settle().await;

        assert!(!state.is_degraded());
        assert!(state.require_store().await.is_ok());
        task.abort();
    }

    #[tokio::test]
    async fn failing_store_enters_degraded_mode() {
        let state = AppState::new();
        let store = MemoryDocumentStore::new();
        store.set_offline(true);

        let handle = store.clone();
        let task = tokio::spawn(run(state.clone(), move || {
            let store: Arc<dyn DocumentStore> = Arc::new(handle.clone());
            async move { Ok::<_, StorageError>(store) }
        }));
        settle().await;

        assert!(state.is_degraded());
        task.abort();
    }

    #[tokio::test]
    async fn connection_failure_keeps_degraded_mode() {
        let state = AppState::new();

        let task = tokio::spawn(run(state.clone(), || async {
            Err::<Arc<dyn DocumentStore>, _>(StorageError::unavailable(
                "connect failed",
                std::io::Error::other("refused"),
            ))
        }));
        settle().await;

        assert!(state.is_degraded());
        assert!(state.store().await.is_none());
        task.abort();
    }
}
