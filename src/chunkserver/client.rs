//! HTTP client for chunkservers

use crate::chunkserver::http::CHUNK_FIELD;
use crate::common::{ensure_success, ChunkId, Result};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Talks to any chunkserver; the target `host:port` is passed per call
#[derive(Debug, Clone)]
pub struct ChunkserverClient {
    http: reqwest::Client,
}

impl ChunkserverClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Push one chunk to the chunkserver at `addr`
    pub async fn store_chunk(&self, addr: &str, chunk_id: &ChunkId, data: Vec<u8>) -> Result<()> {
        let part = Part::bytes(data)
            .file_name(chunk_id.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(CHUNK_FIELD, part);

        let resp = self
            .http
            .post(format!("http://{}/uploadChunk", addr))
            .multipart(form)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    /// Stream one chunk from `addr` into `writer`. Returns the number of bytes written.
    pub async fn fetch_chunk_into<W>(&self, addr: &str, chunk_id: &ChunkId, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let resp = self
            .http
            .get(format!("http://{}/get", addr))
            .query(&[("id", chunk_id.to_string())])
            .send()
            .await?;
        let mut stream = ensure_success(resp).await?.bytes_stream();

        let mut written = 0u64;
        while let Some(bytes) = stream.next().await {
            let bytes = bytes?;
            writer.write_all(&bytes).await?;
            written += bytes.len() as u64;
        }
        Ok(written)
    }
}
