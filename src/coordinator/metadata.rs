//! In-memory metadata: chunkserver registry and file metadata table
//!
//! Stores:
//! - Chunkserver registry (addresses, insertion ordered, no duplicates)
//! - File metadata (name, size, chunk count, replica locations per chunk)
//!
//! Both live behind a single lock so every operation is atomic with respect
//! to the others. Nothing is persisted: a restart starts from empty state.

use crate::common::protocol::{GetResponse, UploadInitResponse};
use crate::common::{number_of_chunks, timestamp_now, ChunkId, Error, FileId, Result};
use crate::coordinator::placement::SelectionStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Upper bound on chunks per file; each chunk costs a replica list in memory
pub const MAX_CHUNKS_PER_FILE: u64 = 1 << 20;

/// Replication progress of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// No chunk has a replica yet
    Planned,
    /// Some, but not all, chunks have a replica
    PartiallyReplicated,
    /// Every chunk has at least one replica
    FullyReplicated,
}

/// File metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_name: String,
    pub file_size: u64,
    pub number_of_chunks: u64,
    /// One replica list per chunk index, each in arrival order
    pub replicas: Vec<Vec<String>>,
    pub created_at: u64,
}

impl FileMetadata {
    fn new(file_name: String, file_size: u64, number_of_chunks: u64) -> Self {
        Self {
            file_name,
            file_size,
            number_of_chunks,
            replicas: vec![Vec::new(); number_of_chunks as usize],
            created_at: timestamp_now(),
        }
    }

    /// Number of chunks without any recorded replica
    pub fn missing_chunks(&self) -> usize {
        self.replicas.iter().filter(|r| r.is_empty()).count()
    }

    pub fn state(&self) -> FileState {
        let missing = self.missing_chunks();
        if missing == 0 {
            FileState::FullyReplicated
        } else if missing == self.replicas.len() {
            FileState::Planned
        } else {
            FileState::PartiallyReplicated
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    chunkservers: Vec<String>,
    files: HashMap<FileId, FileMetadata>,
}

/// Coordinator state
#[derive(Debug)]
pub struct MetadataStore {
    chunk_size: u64,
    inner: RwLock<Inner>,
}

impl MetadataStore {
    /// `chunk_size` must be non-zero (checked by `CoordinatorConfig::validate`)
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::Internal("metadata lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::Internal("metadata lock poisoned".into()))
    }

    // === Chunkserver registry ===

    /// Add a chunkserver address. Returns `false` if it was already known.
    pub fn register_chunkserver(&self, address: &str) -> Result<bool> {
        let mut inner = self.write()?;
        if inner.chunkservers.iter().any(|a| a == address) {
            return Ok(false);
        }
        inner.chunkservers.push(address.to_string());
        Ok(true)
    }

    /// Registered addresses in registration order
    pub fn chunkservers(&self) -> Result<Vec<String>> {
        Ok(self.read()?.chunkservers.clone())
    }

    // === File metadata ===

    /// Create (or reset) the record for `file_name` and return the upload plan.
    pub fn plan_upload(&self, file_name: &str, file_size: u64) -> Result<UploadInitResponse> {
        let mut inner = self.write()?;
        if inner.chunkservers.is_empty() {
            return Err(Error::NoChunkserversAvailable);
        }

        let identifier = FileId::from_name(file_name);
        let chunks = number_of_chunks(file_size, self.chunk_size);
        if chunks > MAX_CHUNKS_PER_FILE {
            return Err(Error::BadRequest(format!(
                "file of {} bytes needs {} chunks, limit is {}",
                file_size, chunks, MAX_CHUNKS_PER_FILE
            )));
        }
        let previous = inner.files.insert(
            identifier.clone(),
            FileMetadata::new(file_name.to_string(), file_size, chunks),
        );
        if previous.is_some() {
            tracing::info!("Re-upload of '{}' resets metadata for {}", file_name, identifier);
        }

        Ok(UploadInitResponse {
            identifier,
            chunk_size: self.chunk_size,
            number_of_chunks: chunks,
            chunkservers: inner.chunkservers.clone(),
        })
    }

    /// Record that `chunkserver` holds `chunk_id`. Returns the chunk's replica
    /// count afterwards. A repeated report from the same chunkserver is a no-op.
    pub fn ack_chunk_upload(&self, chunk_id: &ChunkId, chunkserver: &str) -> Result<usize> {
        let mut inner = self.write()?;
        let meta = inner
            .files
            .get_mut(&chunk_id.file_id)
            .ok_or_else(|| Error::FileNotFound(chunk_id.file_id.to_string()))?;

        let total = meta.number_of_chunks;
        let replicas = usize::try_from(chunk_id.index)
            .ok()
            .and_then(|i| meta.replicas.get_mut(i))
            .ok_or_else(|| {
                Error::BadRequest(format!(
                    "chunk index {} out of range for file with {} chunks",
                    chunk_id.index, total
                ))
            })?;

        if !replicas.iter().any(|a| a == chunkserver) {
            replicas.push(chunkserver.to_string());
        }
        Ok(replicas.len())
    }

    /// Pick one replica per chunk. Fails unless every chunk has a replica.
    pub fn plan_read(
        &self,
        file_id: &FileId,
        strategy: &dyn SelectionStrategy,
    ) -> Result<GetResponse> {
        let inner = self.read()?;
        let meta = inner
            .files
            .get(file_id)
            .ok_or_else(|| Error::FileNotFound(file_id.to_string()))?;

        let missing = meta.missing_chunks();
        if missing > 0 {
            return Err(Error::ChunksUnavailable {
                file_id: file_id.to_string(),
                missing,
                total: meta.replicas.len(),
            });
        }

        let mut locations = Vec::with_capacity(meta.replicas.len());
        for (index, replicas) in meta.replicas.iter().enumerate() {
            let chosen = strategy.select(replicas).ok_or_else(|| {
                Error::Internal(format!("no replica selected for chunk {}", index))
            })?;
            locations.push(chosen.to_string());
        }

        Ok(GetResponse {
            file_name: meta.file_name.clone(),
            locations,
        })
    }

    /// Snapshot of one file record
    pub fn get_file(&self, file_id: &FileId) -> Result<Option<FileMetadata>> {
        Ok(self.read()?.files.get(file_id).cloned())
    }

    /// Snapshot of all file records, ordered by identifier
    pub fn list_files(&self) -> Result<Vec<(FileId, FileMetadata)>> {
        let inner = self.read()?;
        let mut files: Vec<_> = inner
            .files
            .iter()
            .map(|(id, meta)| (id.clone(), meta.clone()))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    pub fn file_count(&self) -> Result<usize> {
        Ok(self.read()?.files.len())
    }
}
