//! Common utilities and types shared across minidfs

pub mod chunk;
pub mod config;
pub mod error;
pub mod hash;
pub mod metrics;
pub mod protocol;
pub mod tracing_middleware;
pub mod utils;

pub use chunk::{chunk_len, chunk_offset, number_of_chunks, MAX_CHUNK_SIZE};
pub use config::{ChunkserverConfig, ClientConfig, Config, CoordinatorConfig, PlacementPolicy};
pub use error::{Error, Result};
pub use hash::{ChunkId, FileId};
pub use metrics::METRICS;
pub use utils::{
    build_http_client, ensure_success, format_bytes, normalize_base_url, outbound_ip,
    shutdown_signal, timestamp_now,
};
