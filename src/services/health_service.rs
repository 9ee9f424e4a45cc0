use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether storage is currently usable, logging probe failures.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                return HealthResponse::degraded();
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{dao::document_store::MemoryDocumentStore, state::AppState};

    #[tokio::test]
    async fn healthy_store_reports_ok() {
        let state = AppState::with_store(Arc::new(MemoryDocumentStore::new())).await;
        assert_eq!(health_status(&state).await.status, "ok");
    }

    #[tokio::test]
    async fn missing_store_reports_degraded() {
        let state = AppState::new();
        assert_eq!(health_status(&state).await.status, "degraded");
    }

    #[tokio::test]
    async fn failing_probe_reports_degraded() {
        let store = MemoryDocumentStore::new();
        let state = AppState::with_store(Arc::new(store.clone())).await;
        store.set_offline(true);

        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
