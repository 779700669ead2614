//! # HTTP Server
//!
//! Combines the case and health routers with CORS, request tracing and
//! panic recovery, and runs them until a shutdown token fires.

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::envelope::panic_response;
use super::routes::{case_routes, fallback_handler, health_routes, AppState};
use crate::config::{parse_origin, ServerConfig};
use crate::error::Result;
use crate::storage::CaseStore;

/// HTTP server for the case API
pub struct CaseServer {
    config: ServerConfig,
    state: AppState,
    router: Router,
}

impl CaseServer {
    /// Create a server whose store is seeded according to `config.seed`.
    pub fn new(config: ServerConfig) -> Self {
        let store = if config.seed {
            CaseStore::seeded()
        } else {
            CaseStore::new()
        };
        Self::with_store(config, store)
    }

    /// Create a server around an existing store.
    pub fn with_store(config: ServerConfig, store: CaseStore) -> Self {
        let state = AppState::new(store, config.strict_not_found);
        let router = Self::build_router(&config, state.clone());
        Self {
            config,
            state,
            router,
        }
    }

    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|origin| match parse_origin(origin) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(error = %e, "ignoring cors origin");
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(health_routes())
            .merge(case_routes(&config.cases_path(), state))
            .fallback(fallback_handler)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Shared state, e.g. to inspect the store while the server runs.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind the configured address and serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` is cancelled.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, cases = %self.config.cases_path(), "case API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("case API stopped");
        Ok(())
    }
}
