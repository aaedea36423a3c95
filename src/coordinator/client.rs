//! HTTP client for the coordinator API, used by chunkservers and clients

use crate::common::protocol::{
    ChunkUploadSuccessRequest, GetQuery, GetResponse, RegisterChunkserverRequest,
    RegisterChunkserverResponse, UploadInitRequest, UploadInitResponse,
};
use crate::common::{ensure_success, normalize_base_url, ChunkId, FileId, Result};

#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub async fn register_chunkserver(&self, address: &str) -> Result<()> {
        let request = RegisterChunkserverRequest {
            url: address.to_string(),
        };
        let resp = self
            .http
            .post(self.url("chunkserver"))
            .json(&request)
            .send()
            .await?;
        let _: RegisterChunkserverResponse = ensure_success(resp).await?.json().await?;
        Ok(())
    }

    pub async fn plan_upload(&self, file_name: &str, file_size: u64) -> Result<UploadInitResponse> {
        let request = UploadInitRequest {
            file_name: file_name.to_string(),
            file_size,
        };
        let resp = self
            .http
            .post(self.url("upload"))
            .json(&request)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    pub async fn report_chunk_upload(&self, chunk_id: &ChunkId, chunkserver: &str) -> Result<()> {
        let request = ChunkUploadSuccessRequest {
            chunk_identifier: chunk_id.to_string(),
            chunkserver: chunkserver.to_string(),
        };
        let resp = self
            .http
            .post(self.url("uploadSuccessful"))
            .json(&request)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    pub async fn plan_read(&self, file_id: &FileId) -> Result<GetResponse> {
        let query = GetQuery {
            id: file_id.to_string(),
        };
        let resp = self
            .http
            .get(self.url("get"))
            .query(&query)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }
}
