//! Error types for minidfs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Request Errors ===
    #[error("Bad request: {0}")]
    BadRequest(String),

    // === Lookup Errors ===
    #[error("file with identifier '{0}' not found")]
    FileNotFound(String),

    #[error("chunk '{0}' not found")]
    ChunkNotFound(String),

    #[error("file '{file_id}' exists but {missing} of {total} chunks are currently unavailable")]
    ChunksUnavailable {
        file_id: String,
        missing: usize,
        total: usize,
    },

    // === Placement Errors ===
    #[error("no chunkserver available")]
    NoChunkserversAvailable,

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    Storage(String),

    // === Network Errors ===
    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("{url} answered {status}: {message}")]
    Remote {
        url: String,
        status: u16,
        message: String,
    },

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Is this a lookup miss (unknown file, unknown chunk, missing replicas)?
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_) | Error::ChunkNotFound(_) | Error::ChunksUnavailable { .. }
        ) || matches!(self, Error::Remote { status, .. } if *status == 404)
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::FileNotFound(_) | Error::ChunkNotFound(_) | Error::ChunksUnavailable { .. } => {
                StatusCode::NOT_FOUND
            }
            Error::NoChunkserversAvailable => StatusCode::SERVICE_UNAVAILABLE,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Network(_) | Error::Remote { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.to_http_status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
