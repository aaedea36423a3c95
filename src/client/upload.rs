use super::{Client, UploadReport};
use crate::common::{chunk_len, chunk_offset, number_of_chunks, ChunkId, Error, Result};
use std::io::SeekFrom;
use std::path::Path;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

impl Client {
    /// Store the local file at `path` under the logical name `file_name`.
    ///
    /// Each chunk goes to one chunkserver picked from the upload plan. The
    /// first failure aborts the write; chunks already pushed stay where they are.
    pub async fn write(&self, path: impl AsRef<Path>, file_name: &str) -> Result<UploadReport> {
        let started = Instant::now();
        let path = path.as_ref();
        let mut file = File::open(path).await?;
        let file_size = file.metadata().await?.len();

        let plan = self.coordinator.plan_upload(file_name, file_size).await?;
        tracing::debug!(
            file_id = %plan.identifier,
            chunks = plan.number_of_chunks,
            chunk_size = plan.chunk_size,
            "Received upload plan"
        );
        if plan.chunk_size == 0
            || plan.number_of_chunks != number_of_chunks(file_size, plan.chunk_size)
        {
            return Err(Error::Internal(format!(
                "inconsistent upload plan: {} chunks of {} bytes for a {} byte file",
                plan.number_of_chunks, plan.chunk_size, file_size
            )));
        }

        for index in 0..plan.number_of_chunks {
            let len = chunk_len(file_size, plan.chunk_size, index);
            let mut buf = vec![0u8; len as usize];
            file.seek(SeekFrom::Start(chunk_offset(plan.chunk_size, index)))
                .await?;
            file.read_exact(&mut buf).await?;

            let addr = self
                .placement
                .select(&plan.chunkservers)
                .ok_or(Error::NoChunkserversAvailable)?;
            let chunk_id = ChunkId::new(plan.identifier.clone(), index);
            self.chunkservers.store_chunk(addr, &chunk_id, buf).await?;
            tracing::debug!(chunk_id = %chunk_id, chunkserver = addr, bytes = len, "Pushed chunk");
        }

        let report = UploadReport {
            file_id: plan.identifier,
            file_name: file_name.to_string(),
            chunks: plan.number_of_chunks,
            bytes: file_size,
            elapsed: started.elapsed(),
        };
        tracing::info!("{}", report);
        Ok(report)
    }
}
