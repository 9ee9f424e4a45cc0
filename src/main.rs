//! tebot-back binary entrypoint wiring the REST routes to the configured document store.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tebot_back::{
    config::{AppConfig, StoreBackend},
    dao::document_store::MemoryDocumentStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new();
    start_storage(&app_state, config.store).await?;

    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, store = %config.store, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the selected store, supervising remote backends in the background.
async fn start_storage(state: &SharedState, backend: StoreBackend) -> anyhow::Result<()> {
    match backend {
        StoreBackend::Memory => {
            warn!("using the in-memory store; data is lost on restart");
            state.set_store(Arc::new(MemoryDocumentStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            use tebot_back::{
                dao::{
                    document_store::{
                        DocumentStore,
                        mongodb::{MongoConfig, MongoDocumentStore},
                    },
                    storage::StorageError,
                },
                services::storage_supervisor,
            };

            tokio::spawn(storage_supervisor::run(state.clone(), || async {
                let config = MongoConfig::from_env().await?;
                let store: Arc<dyn DocumentStore> =
                    Arc::new(MongoDocumentStore::connect(config).await?);
                Ok::<_, StorageError>(store)
            }));
        }
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            use tebot_back::{
                dao::{
                    document_store::{
                        DocumentStore,
                        couchdb::{CouchConfig, CouchDocumentStore},
                    },
                    storage::StorageError,
                },
                services::storage_supervisor,
            };

            // Missing variables will not appear later, so fail fast instead of retrying.
            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            tokio::spawn(storage_supervisor::run(state.clone(), move || {
                let config = config.clone();
                async move {
                    let store: Arc<dyn DocumentStore> =
                        Arc::new(CouchDocumentStore::connect(config).await?);
                    Ok::<_, StorageError>(store)
                }
            }));
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("store backend `{other}` is not compiled into this binary"),
    }
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
