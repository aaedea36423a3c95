//! Chunkserver

use crate::chunkserver::http::{create_router, ChunkserverState};
use crate::chunkserver::store::ChunkStore;
use crate::common::{build_http_client, outbound_ip, shutdown_signal, ChunkserverConfig, Result};
use crate::coordinator::CoordinatorClient;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ChunkserverServer {
    config: ChunkserverConfig,
}

impl ChunkserverServer {
    pub fn new(config: ChunkserverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Address announced to the coordinator for a server bound to `port`
    pub fn advertise_addr(&self, port: u16) -> String {
        if let Some(addr) = &self.config.advertise_addr {
            return addr.clone();
        }
        let ip = match outbound_ip() {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!("Could not determine outbound IP, advertising loopback: {}", e);
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            }
        };
        SocketAddr::new(ip, port).to_string()
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Register with the coordinator, then serve on `listener` until
    /// `shutdown` resolves. Registration failure aborts startup.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        let advertise_addr = self.advertise_addr(local_addr.port());

        tracing::info!("Starting chunkserver");
        tracing::info!("  HTTP API: {}", local_addr);
        tracing::info!("  Advertised as: {}", advertise_addr);
        tracing::info!("  Data dir: {}", self.config.data_dir.display());
        tracing::info!("  Coordinator: {}", self.config.coordinator_url);

        let store = ChunkStore::open(&self.config.data_dir).await?;
        let http = build_http_client(self.config.request_timeout())?;
        let coordinator = CoordinatorClient::new(&self.config.coordinator_url, http);

        if let Err(e) = coordinator.register_chunkserver(&advertise_addr).await {
            tracing::error!(
                "Failed to register with coordinator {}: {}",
                coordinator.base_url(),
                e
            );
            return Err(e);
        }
        tracing::info!("Registered with coordinator {}", coordinator.base_url());

        let state = ChunkserverState {
            store,
            coordinator,
            advertise_addr: Arc::from(advertise_addr),
            max_chunk_bytes: usize::try_from(self.config.max_chunk_bytes).unwrap_or(usize::MAX),
        };
        let router = create_router(state);

        tracing::info!("✓ Chunkserver ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Chunkserver stopped");
        Ok(())
    }
}
