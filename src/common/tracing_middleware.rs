//! Request logging middleware shared by the coordinator and chunkservers
//!
//! Every request gets an `X-Request-ID` (propagated if the caller sent one),
//! runs inside an `http_request` span and is logged with status and latency.

use crate::common::METRICS;
use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{field, Instrument, Span};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Metrics label for requests that matched no route
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Longest caller-supplied request id we echo back
const MAX_REQUEST_ID_LEN: usize = 128;

pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// The caller's request id if usable, otherwise a fresh one
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_owned)
        .unwrap_or_else(generate_request_id)
}

pub async fn request_tracing_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request_id(request.headers());
    let path = request.uri().path().to_owned();
    // route template, so metrics stay bounded by the router's routes
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %path,
        status = field::Empty,
        latency_ms = field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    METRICS.record_request(&route, is_ok(status));
    log_completion(&span, status, started.elapsed().as_millis());

    response
}

fn is_ok(status: StatusCode) -> bool {
    !status.is_client_error() && !status.is_server_error()
}

fn log_completion(span: &Span, status: StatusCode, latency_ms: u128) {
    span.record("status", status.as_u16());
    span.record("latency_ms", latency_ms as u64);
    let _entered = span.enter();
    if is_ok(status) {
        tracing::info!("request served");
    } else {
        tracing::warn!("request failed");
    }
}
