//! Yedalm - community site and admin console
//!
//! Serves the public home page and an admin API over content kept in a
//! hosted PostgREST-style data API. Reordering in the console is optimistic:
//! the held list changes first and positions are written back row by row.

pub mod admin;
pub mod config;
pub mod entity;
pub mod error;
pub mod image;
pub mod io;
pub mod list_view;
pub mod mock;
pub mod page;
pub mod reorder;
pub mod session;
pub mod site;
pub mod state;
pub mod store;

pub use config::{load_config, Config};
pub use error::{Result, YedalmError};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::BackendConfig;
use crate::io::ReqwestHttpClient;
use crate::mock::MemoryStore;
use crate::site::SiteState;
use crate::store::{PostgrestStore, RemoteStore};

/// Store selected by the backend configuration
pub fn build_store(backend: &BackendConfig) -> Result<Arc<dyn RemoteStore>> {
    if backend.is_memory() {
        tracing::warn!(
            "No backend URL configured, serving in-memory demo content with admin password \"admin\""
        );
        return Ok(Arc::new(MemoryStore::demo()));
    }
    let http: Arc<dyn io::HttpClient> = Arc::new(ReqwestHttpClient::new(&backend.anon_key)?);
    Ok(Arc::new(PostgrestStore::new(&backend.url, http)))
}

/// Run the yedalm site with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let store = build_store(&config.backend)?;
    let cancel = CancellationToken::new();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    serve(config, store, cancel).await
}

/// Serve the site on the configured address until `cancel` fires
pub async fn serve(
    config: Config,
    store: Arc<dyn RemoteStore>,
    cancel: CancellationToken,
) -> Result<()> {
    let state = SiteState::new(store, config.images).with_session_limits(
        Duration::from_secs(config.site.session_idle_seconds),
        config.site.max_sessions,
    );
    let router = site::build_router(state);
    let addr = format!("{}:{}", config.site.bind, config.site.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| YedalmError::Site(format!("Failed to bind site to {}: {}", addr, e)))?;
    tracing::info!("Site listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;

    tracing::info!("Site stopped");
    Ok(())
}
