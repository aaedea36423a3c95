//! Chunk storage on the local filesystem
//!
//! Each chunk is one file named by its chunk identifier directly under the
//! data directory. Writes land in a temporary file first and are renamed into
//! place, so a reader never observes a half-written chunk.

use crate::common::{ChunkId, Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    /// Open the store, creating the data directory if needed
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::Storage(format!("cannot create data directory {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    fn chunk_path(&self, chunk_id: &ChunkId) -> PathBuf {
        // ChunkId only renders as hex + '_' + digits, never a path component
        self.dir.join(chunk_id.to_string())
    }

    /// Store `data` under `chunk_id`, replacing any previous content
    pub async fn put(&self, chunk_id: &ChunkId, data: &[u8]) -> Result<()> {
        let path = self.chunk_path(chunk_id);
        let tmp = self
            .dir
            .join(format!("{}{}-{}", chunk_id, TMP_SUFFIX, uuid::Uuid::new_v4()));

        let result = async {
            let mut file = File::create(&tmp).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp).await;
            return Err(Error::Storage(format!(
                "error writing chunk {}: {}",
                chunk_id, e
            )));
        }
        Ok(())
    }

    /// Open a stored chunk for streaming. Returns the file and its length.
    pub async fn open_chunk(&self, chunk_id: &ChunkId) -> Result<(File, u64)> {
        let path = self.chunk_path(chunk_id);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ChunkNotFound(chunk_id.to_string()))
            }
            Err(e) => {
                return Err(Error::Storage(format!(
                    "couldn't open chunk file {}: {}",
                    chunk_id, e
                )))
            }
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Read a whole chunk into memory
    pub async fn get(&self, chunk_id: &ChunkId) -> Result<Vec<u8>> {
        match fs::read(self.chunk_path(chunk_id)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::ChunkNotFound(chunk_id.to_string()))
            }
            Err(e) => Err(Error::Storage(format!(
                "couldn't read chunk file {}: {}",
                chunk_id, e
            ))),
        }
    }

    /// Identifiers of all stored chunks. Foreign files are ignored.
    pub async fn list(&self) -> Result<Vec<ChunkId>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut chunks = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(chunk_id) = name.parse::<ChunkId>() {
                    chunks.push(chunk_id);
                }
            }
        }
        Ok(chunks)
    }
}
