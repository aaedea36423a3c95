use super::{Client, DownloadReport};
use crate::common::protocol::GetResponse;
use crate::common::{FileId, Result};
use std::path::Path;
use std::time::Instant;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

impl Client {
    /// Fetch the file stored under `file_name` into `output`.
    ///
    /// On failure the partially written output file is removed.
    pub async fn read(&self, file_name: &str, output: impl AsRef<Path>) -> Result<DownloadReport> {
        let started = Instant::now();
        let output = output.as_ref();
        let file_id = FileId::from_name(file_name);

        let plan = self.coordinator.plan_read(&file_id).await?;
        tracing::debug!(
            file_id = %file_id,
            chunks = plan.locations.len(),
            "Received read plan"
        );

        let file = File::create(output).await?;
        let bytes = match self.fetch_chunks(&file_id, &plan, file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(rm) = fs::remove_file(output).await {
                    tracing::warn!("Could not remove partial file {}: {}", output.display(), rm);
                }
                return Err(e);
            }
        };

        let report = DownloadReport {
            file_id,
            file_name: plan.file_name,
            chunks: plan.locations.len() as u64,
            bytes,
            elapsed: started.elapsed(),
        };
        tracing::info!("{}", report);
        Ok(report)
    }

    async fn fetch_chunks(&self, file_id: &FileId, plan: &GetResponse, file: File) -> Result<u64> {
        let mut writer = BufWriter::new(file);
        let mut total = 0u64;
        for (chunk_id, addr) in plan.chunks(file_id) {
            let n = self
                .chunkservers
                .fetch_chunk_into(addr, &chunk_id, &mut writer)
                .await?;
            tracing::debug!(chunk_id = %chunk_id, chunkserver = addr, bytes = n, "Fetched chunk");
            total += n;
        }
        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(total)
    }
}
