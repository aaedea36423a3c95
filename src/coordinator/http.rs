//! HTTP API for the coordinator
//!
//! - `POST /chunkserver`: register a chunkserver
//! - `POST /upload`: plan an upload
//! - `POST /uploadSuccessful`: a chunkserver reports a stored chunk
//! - `GET /get?id=<file id>`: plan a read
//! - `GET /health`, `GET /admin/status`, `GET /metrics`: operator endpoints

use crate::common::protocol::{
    ChunkUploadSuccessRequest, GetQuery, GetResponse, RegisterChunkserverRequest,
    RegisterChunkserverResponse, UploadInitRequest, UploadInitResponse,
};
use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{ChunkId, Error, FileId, Result, METRICS};
use crate::coordinator::metadata::{FileState, MetadataStore};
use crate::coordinator::placement::SelectionStrategy;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Shared coordinator state for HTTP handlers.
#[derive(Clone)]
pub struct CoordState {
    pub metadata: Arc<MetadataStore>,
    pub placement: Arc<dyn SelectionStrategy>,
}

/// Creates the HTTP router with all coordinator endpoints.
pub fn create_router(state: CoordState) -> Router {
    Router::new()
        .route("/chunkserver", post(register_chunkserver))
        .route("/upload", post(plan_upload))
        .route("/uploadSuccessful", post(upload_successful))
        .route("/get", get(plan_read))
        .route("/health", get(health))
        .route("/admin/status", get(admin_status))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(request_tracing_middleware))
        .with_state(state)
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| Error::BadRequest(format!("error parsing request body: {}", e.body_text())))
}

async fn register_chunkserver(
    State(state): State<CoordState>,
    payload: std::result::Result<Json<RegisterChunkserverRequest>, JsonRejection>,
) -> Result<Json<RegisterChunkserverResponse>> {
    let req = json_body(payload)?;
    let url = req.url.trim();
    if url.is_empty() {
        return Err(Error::BadRequest("chunkserver url cannot be empty".into()));
    }

    if state.metadata.register_chunkserver(url)? {
        tracing::info!("Registered chunkserver {}", url);
    } else {
        tracing::debug!("Chunkserver {} registered again", url);
    }
    METRICS.chunkservers_registered.inc();

    Ok(Json(RegisterChunkserverResponse::default()))
}

async fn plan_upload(
    State(state): State<CoordState>,
    payload: std::result::Result<Json<UploadInitRequest>, JsonRejection>,
) -> Result<Json<UploadInitResponse>> {
    let req = json_body(payload)?;
    let plan = state.metadata.plan_upload(&req.file_name, req.file_size)?;
    METRICS.upload_plans.inc();

    tracing::info!(
        file_name = %req.file_name,
        file_id = %plan.identifier,
        chunks = plan.number_of_chunks,
        "Planned upload"
    );
    Ok(Json(plan))
}

async fn upload_successful(
    State(state): State<CoordState>,
    payload: std::result::Result<Json<ChunkUploadSuccessRequest>, JsonRejection>,
) -> Result<StatusCode> {
    let req = json_body(payload)?;
    let chunk_id: ChunkId = req.chunk_identifier.parse()?;
    if req.chunkserver.trim().is_empty() {
        return Err(Error::BadRequest("chunkserver address cannot be empty".into()));
    }

    let replicas = state
        .metadata
        .ack_chunk_upload(&chunk_id, req.chunkserver.trim())?;
    METRICS.chunk_acks.inc();

    tracing::debug!(
        chunk_id = %chunk_id,
        chunkserver = %req.chunkserver,
        replicas,
        "Recorded chunk replica"
    );
    Ok(StatusCode::OK)
}

async fn plan_read(
    State(state): State<CoordState>,
    query: std::result::Result<Query<GetQuery>, QueryRejection>,
) -> Result<Json<GetResponse>> {
    let Query(query) = query.map_err(|e| Error::BadRequest(e.body_text()))?;
    // no record can exist under an id that is not a file identifier
    let file_id: FileId = query
        .id
        .parse()
        .map_err(|_| Error::FileNotFound(query.id.clone()))?;

    match state.metadata.plan_read(&file_id, state.placement.as_ref()) {
        Ok(plan) => {
            METRICS.read_plans.inc();
            Ok(Json(plan))
        }
        Err(e @ Error::ChunksUnavailable { .. }) => {
            METRICS.read_plans_unavailable.inc();
            Err(e)
        }
        Err(e) => Err(e),
    }
}

async fn health(State(state): State<CoordState>) -> Result<impl IntoResponse> {
    Ok(Json(json!({
        "status": "healthy",
        "role": "coordinator",
        "version": crate::VERSION,
        "chunkservers": state.metadata.chunkservers()?.len(),
        "files": state.metadata.file_count()?,
    })))
}

#[derive(Debug, Serialize)]
struct FileSummary {
    identifier: String,
    file_name: String,
    file_size: u64,
    number_of_chunks: u64,
    replica_counts: Vec<usize>,
    state: FileState,
    created_at: u64,
}

/// Admin endpoint: registry and per-file replication state
async fn admin_status(State(state): State<CoordState>) -> Result<impl IntoResponse> {
    let files: Vec<FileSummary> = state
        .metadata
        .list_files()?
        .into_iter()
        .map(|(id, meta)| FileSummary {
            identifier: id.to_string(),
            state: meta.state(),
            replica_counts: meta.replicas.iter().map(Vec::len).collect(),
            file_name: meta.file_name,
            file_size: meta.file_size,
            number_of_chunks: meta.number_of_chunks,
            created_at: meta.created_at,
        })
        .collect();

    Ok(Json(json!({
        "chunk_size": state.metadata.chunk_size(),
        "placement": state.placement.name(),
        "chunkservers": state.metadata.chunkservers()?,
        "files": files,
    })))
}

async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        METRICS.to_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::placement::UniformRandom;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        create_router(CoordState {
            metadata: Arc::new(MetadataStore::new(1000)),
            placement: Arc::new(UniformRandom),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_upload_requires_registered_chunkserver() {
        let app = router();
        let upload = json!({ "fileName": "a.txt", "fileSize": 2500 });

        let (status, _) = send(&app, "POST", "/upload", Some(upload.clone())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(&app, "POST", "/chunkserver", Some(json!({ "url": "h:1" }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", "/upload", Some(upload)).await;
        assert_eq!(status, StatusCode::OK);
        let plan: UploadInitResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(plan.number_of_chunks, 3);
        assert_eq!(plan.chunk_size, 1000);
        assert_eq!(plan.chunkservers, vec!["h:1"]);
    }

    #[tokio::test]
    async fn test_ack_then_read() {
        let app = router();
        send(&app, "POST", "/chunkserver", Some(json!({ "url": "h:1" }))).await;
        send(
            &app,
            "POST",
            "/upload",
            Some(json!({ "fileName": "a.txt", "fileSize": 10 })),
        )
        .await;
        let id = FileId::from_name("a.txt");
        let get_uri = format!("/get?id={}", id);

        let (status, _) = send(&app, "GET", &get_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let ack = json!({ "chunkIdentifier": format!("{}_0", id), "chunkserver": "h:1" });
        let (status, _) = send(&app, "POST", "/uploadSuccessful", Some(ack)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", &get_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let plan: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(plan["FileName"], "a.txt");
        assert_eq!(plan["Locations"], json!(["h:1"]));
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let app = router();

        let ack = json!({ "chunkIdentifier": "not-a-chunk", "chunkserver": "h:1" });
        let (status, _) = send(&app, "POST", "/uploadSuccessful", Some(ack)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/upload", Some(json!({ "fileName": 3 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/get", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);


        let (status, _) = send(&app, "POST", "/chunkserver", Some(json!({ "url": " " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_read_of_malformed_id_is_not_found() {
        let app = router();
        send(&app, "POST", "/chunkserver", Some(json!({ "url": "h:1" }))).await;

        for uri in ["/get?id=xyz", "/get?id=", "/get?id=ABCDEF"] {
            let (status, _) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        }

        let unknown = format!("/get?id={}", FileId::from_name("never-planned"));
        let (status, _) = send(&app, "GET", &unknown, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ack_for_unknown_file() {
        let app = router();
        let id = FileId::from_name("never-planned");
        let ack = json!({ "chunkIdentifier": format!("{}_0", id), "chunkserver": "h:1" });
        let (status, body) = send(&app, "POST", "/uploadSuccessful", Some(ack)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(String::from_utf8_lossy(&body).contains(id.as_str()));
    }

    #[tokio::test]
    async fn test_admin_status_reports_state() {
        let app = router();
        send(&app, "POST", "/chunkserver", Some(json!({ "url": "h:1" }))).await;
        send(
            &app,
            "POST",
            "/upload",
            Some(json!({ "fileName": "a.txt", "fileSize": 1500 })),
        )
        .await;

        let (status, body) = send(&app, "GET", "/admin/status", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["chunkservers"], json!(["h:1"]));
        assert_eq!(json["files"][0]["file_name"], "a.txt");
        assert_eq!(json["files"][0]["state"], "planned");
        assert_eq!(json["files"][0]["replica_counts"], json!([0, 0]));
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let app = router();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["role"], "coordinator");
        assert_eq!(json["version"], crate::VERSION);

        let (status, body) = send(&app, "GET", "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("minidfs_upload_plans_total"));
    }
}
