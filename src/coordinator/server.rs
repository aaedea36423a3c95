//! Coordinator server

use crate::common::{shutdown_signal, CoordinatorConfig, Result};
use crate::coordinator::http::{create_router, CoordState};
use crate::coordinator::metadata::MetadataStore;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct Coordinator {
    config: CoordinatorConfig,
    metadata: Arc<MetadataStore>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        let metadata = Arc::new(MetadataStore::new(config.chunk_size));
        Ok(Self { config, metadata })
    }

    /// Handle on the in-memory state, shared with the HTTP handlers
    pub fn metadata(&self) -> Arc<MetadataStore> {
        self.metadata.clone()
    }

    pub fn router(&self) -> Router {
        create_router(CoordState {
            metadata: self.metadata.clone(),
            placement: self.config.placement.strategy(),
        })
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("Starting coordinator");
        tracing::info!("  HTTP API: {}", listener.local_addr()?);
        tracing::info!("  Chunk size: {} bytes", self.config.chunk_size);
        tracing::info!("  Placement: {:?}", self.config.placement);

        let router = self.router();

        tracing::info!("✓ Coordinator ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Coordinator stopped");
        Ok(())
    }
}
