//! In-process cluster for integration tests

#![allow(dead_code)]

use minidfs::common::{ChunkserverConfig, ClientConfig, CoordinatorConfig, PlacementPolicy};
use minidfs::coordinator::metadata::MetadataStore;
use minidfs::{ChunkserverServer, Client, Coordinator, Error};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestCluster {
    pub coordinator_url: String,
    pub metadata: Arc<MetadataStore>,
    pub chunkserver_dirs: Vec<PathBuf>,
    _tmp: TempDir,
}

impl TestCluster {
    pub async fn start(chunk_size: u64, chunkservers: usize) -> Self {
        let max_chunk_bytes = ChunkserverConfig::default().max_chunk_bytes;
        Self::start_with_limit(chunk_size, chunkservers, max_chunk_bytes).await
    }

    /// Like `start`, with chunkservers accepting at most `max_chunk_bytes` per chunk
    pub async fn start_with_limit(chunk_size: u64, chunkservers: usize, max_chunk_bytes: u64) -> Self {
        let tmp = TempDir::new().unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let coordinator_url = format!("http://{}", listener.local_addr().unwrap());
        let coordinator = Coordinator::new(CoordinatorConfig {
            chunk_size,
            ..Default::default()
        })
        .unwrap();
        let metadata = coordinator.metadata();
        tokio::spawn(coordinator.serve_on(listener, std::future::pending()));

        let mut chunkserver_dirs = Vec::new();
        for i in 0..chunkservers {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let data_dir = tmp.path().join(format!("cs{}", i));
            let server = ChunkserverServer::new(ChunkserverConfig {
                coordinator_url: coordinator_url.clone(),
                data_dir: data_dir.clone(),
                advertise_addr: Some(format!("127.0.0.1:{}", port)),
                max_chunk_bytes,
                ..Default::default()
            })
            .unwrap();
            tokio::spawn(server.serve_on(listener, std::future::pending()));
            chunkserver_dirs.push(data_dir);
        }

        let cluster = Self {
            coordinator_url,
            metadata,
            chunkserver_dirs,
            _tmp: tmp,
        };
        cluster.wait_for_chunkservers(chunkservers).await;
        cluster
    }

    async fn wait_for_chunkservers(&self, expected: usize) {
        for _ in 0..100 {
            if self.metadata.chunkservers().unwrap().len() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("chunkservers did not register");
    }

    pub fn client(&self) -> Client {
        self.client_with(PlacementPolicy::UniformRandom)
    }

    pub fn client_with(&self, placement: PlacementPolicy) -> Client {
        Client::new(ClientConfig {
            coordinator_url: self.coordinator_url.clone(),
            request_timeout_ms: 5_000,
            placement,
        })
        .unwrap()
    }
}

/// Chunk acks are asynchronous: retry the read until every chunk is known
pub async fn read_when_ready(
    client: &Client,
    name: &str,
    output: &std::path::Path,
) -> minidfs::Result<minidfs::DownloadReport> {
    let mut last = None;
    for _ in 0..100 {
        match client.read(name, output).await {
            Ok(report) => return Ok(report),
            Err(e) if e.is_not_found() => {
                last = Some(e);
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last.unwrap_or_else(|| Error::Internal("read never attempted".into())))
}

/// Deterministic, non-repeating-per-chunk content
pub fn test_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
