//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::AppState;
use super::router::{build_routes, health_routes};
use crate::config::NexusConfig;
use crate::core::service::TransactionService;
use crate::core::store::TransactionStore;
use crate::storage::open_store;
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for the deposit-recording HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_store(InMemoryTransactionStore::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn TransactionStore>>,
    config: NexusConfig,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self {
            store: None,
            config: NexusConfig::default(),
            custom_routes: Vec::new(),
        }
    }

    /// Use `config` for the listener, listing cap, share-link origin and
    /// runtime marker
    pub fn with_config(mut self, config: NexusConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the transaction store
    pub fn with_store(mut self, store: impl TransactionStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set an already shared transaction store
    pub fn with_shared_store(mut self, store: Arc<dyn TransactionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    pub fn config(&self) -> &NexusConfig {
        &self.config
    }

    /// Open the store named by the configuration unless one was set explicitly
    pub async fn open_configured_store(mut self) -> Result<Self> {
        if self.store.is_none() {
            let store = open_store(&self.config.storage)
                .await
                .with_context(|| {
                    format!("failed to open {} storage", self.config.storage.backend)
                })?;
            tracing::info!(backend = store.backend(), "transaction store ready");
            self.store = Some(store);
        }
        Ok(self)
    }

    /// Build the application state shared by all handlers
    pub fn build_state(&self) -> Result<AppState> {
        let store = self
            .store
            .clone()
            .ok_or_else(|| anyhow::anyhow!("A transaction store is required. Call .with_store()"))?;

        Ok(AppState {
            service: TransactionService::new(store)
                .with_max_results(self.config.listing.max_results),
            detector: self.config.runtime.detector(),
            public_origin: Arc::from(self.config.server.public_origin.as_str()),
        })
    }

    /// Build the final router
    ///
    /// Health routes, API routes and custom routes, wrapped in request
    /// tracing and a permissive CORS layer for the mini-app webview.
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;

        let mut app = health_routes().merge(build_routes(state));
        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }

        Ok(app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        ))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Open the configured store if none was set
    /// - Bind to `server.bind`
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let builder = self.open_configured_store().await?;
        let addr = builder.config.bind_addr()?;
        let app = builder.build()?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed that branch never resolves; the other
/// signal still works.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
