//! Client library
//!
//! Splits a local file into chunks and pushes them to chunkservers following
//! the coordinator's upload plan; reads a file back by asking the coordinator
//! for one location per chunk and concatenating the chunks in order.

mod download;
mod upload;

use crate::chunkserver::ChunkserverClient;
use crate::common::{build_http_client, format_bytes, ClientConfig, FileId, Result};
use crate::coordinator::placement::SelectionStrategy;
use crate::coordinator::CoordinatorClient;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub struct Client {
    coordinator: CoordinatorClient,
    chunkservers: ChunkserverClient,
    placement: Arc<dyn SelectionStrategy>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = build_http_client(config.request_timeout())?;
        Ok(Self {
            coordinator: CoordinatorClient::new(&config.coordinator_url, http.clone()),
            chunkservers: ChunkserverClient::new(http),
            placement: config.placement.strategy(),
        })
    }
}

/// Outcome of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub file_id: FileId,
    pub file_name: String,
    pub chunks: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uploaded {} ({}) as {} in {} chunk(s), {:.2?}",
            self.file_name,
            format_bytes(self.bytes),
            self.file_id,
            self.chunks,
            self.elapsed
        )
    }
}

/// Outcome of a successful read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub file_id: FileId,
    pub file_name: String,
    pub chunks: u64,
    pub bytes: u64,
    pub elapsed: Duration,
}

impl fmt::Display for DownloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downloaded {} ({}) from {} chunk(s), {:.2?}",
            self.file_name,
            format_bytes(self.bytes),
            self.chunks,
            self.elapsed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let report = UploadReport {
            file_id: FileId::from_name("a.txt"),
            file_name: "a.txt".into(),
            chunks: 3,
            bytes: 2048,
            elapsed: Duration::from_millis(5),
        };
        let text = report.to_string();
        assert!(text.contains("a.txt"));
        assert!(text.contains("2.00 KB"));
        assert!(text.contains("3 chunk(s)"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig {
            coordinator_url: "".into(),
            ..Default::default()
        };
        assert!(Client::new(config).is_err());
    }
}
