//! HTTP API for chunkservers
//!
//! - `POST /uploadChunk`: multipart form, field `chunk`, file name = chunk id
//! - `GET /get?id=<chunk id>`: stream a stored chunk
//! - `GET /health`, `GET /metrics`

use crate::chunkserver::store::ChunkStore;
use crate::common::protocol::GetQuery;
use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{ChunkId, Error, Result, METRICS};
use crate::coordinator::CoordinatorClient;
use async_stream::stream;
use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::json;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Multipart field carrying chunk bytes
pub const CHUNK_FIELD: &str = "chunk";

/// Allowance for multipart boundaries and part headers on top of the chunk
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

const STREAM_BUF_SIZE: usize = 64 * 1024;

#[derive(Clone)]
pub struct ChunkserverState {
    pub store: ChunkStore,
    pub coordinator: CoordinatorClient,
    /// `host:port` this chunkserver reports to the coordinator
    pub advertise_addr: Arc<str>,
    /// Largest chunk accepted by `/uploadChunk`
    pub max_chunk_bytes: usize,
}

pub fn create_router(state: ChunkserverState) -> Router {
    let body_limit = state.max_chunk_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/uploadChunk", post(upload_chunk))
        .route("/get", get(get_chunk))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_tracing_middleware))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}

fn multipart_error(e: MultipartError) -> Error {
    Error::BadRequest(format!("error reading multipart body: {}", e.body_text()))
}

async fn upload_chunk(
    State(state): State<ChunkserverState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<StatusCode> {
    let mut multipart = multipart.map_err(|e| Error::BadRequest(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(CHUNK_FIELD) {
            continue;
        }
        let chunk_id: ChunkId = field
            .file_name()
            .ok_or_else(|| Error::BadRequest("chunk field has no file name".into()))?
            .parse()?;
        let data = field.bytes().await.map_err(multipart_error)?;
        if data.len() > state.max_chunk_bytes {
            return Err(Error::BadRequest(format!(
                "chunk of {} bytes exceeds the limit of {} bytes",
                data.len(),
                state.max_chunk_bytes
            )));
        }

        state.store.put(&chunk_id, &data).await?;
        METRICS.chunks_stored.inc();
        METRICS.chunk_bytes_stored.add(data.len() as u64);
        tracing::debug!(chunk_id = %chunk_id, bytes = data.len(), "Stored chunk");

        spawn_ack(&state, chunk_id);
        return Ok(StatusCode::OK);
    }

    Err(Error::BadRequest(format!(
        "missing multipart field '{}'",
        CHUNK_FIELD
    )))
}

/// Report a stored chunk to the coordinator without holding up the uploader
fn spawn_ack(state: &ChunkserverState, chunk_id: ChunkId) {
    let coordinator = state.coordinator.clone();
    let addr = state.advertise_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = coordinator.report_chunk_upload(&chunk_id, &addr).await {
            METRICS.ack_failures.inc();
            tracing::warn!(
                chunk_id = %chunk_id,
                "Failed to report chunk to coordinator: {}",
                e
            );
        }
    });
}

async fn get_chunk(
    State(state): State<ChunkserverState>,
    query: std::result::Result<Query<GetQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|e| Error::BadRequest(e.body_text()))?;
    let chunk_id: ChunkId = query.id.parse()?;
    let (mut file, len) = state.store.open_chunk(&chunk_id).await?;
    METRICS.chunks_served.inc();

    let body = stream! {
        let mut buf = vec![0u8; STREAM_BUF_SIZE];
        loop {
            match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => yield Ok::<_, std::io::Error>(Bytes::copy_from_slice(&buf[..n])),
                Err(e) => {
                    tracing::warn!(chunk_id = %chunk_id, "Error streaming chunk: {}", e);
                    yield Err(e);
                    break;
                }
            }
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

async fn health(State(state): State<ChunkserverState>) -> Result<impl IntoResponse> {
    Ok(Json(json!({
        "status": "healthy",
        "role": "chunkserver",
        "version": crate::VERSION,
        "address": state.advertise_addr.as_ref(),
        "chunks": state.store.list().await?.len(),
    })))
}

async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        METRICS.to_prometheus(),
    )
}
