//! # minidfs
//!
//! A minimal distributed chunked file store:
//! - a single in-memory coordinator ("master") that plans uploads and reads
//! - chunkservers that store fixed-size chunks as plain files
//! - a client that splits files into chunks and reassembles them
//!
//! ## Architecture

#![allow(clippy::result_large_err)]
//!
//! ```text
//!        ┌──────────────────────────────┐
//!        │         Coordinator          │
//!        │  registry + file metadata    │
//!        └──▲────────────▲───────────▲──┘
//!   plan    │            │ register  │ ack
//!           │            │           │
//! ┌─────────┴──┐   ┌─────┴──────┐   ┌┴─────────────┐
//! │   Client   │──▶│ Chunkserver│   │ Chunkserver  │
//! │            │──────────────────▶│              │
//! └────────────┘   └────────────┘   └──────────────┘
//!        chunk bytes over HTTP
//! ```
//!
//! ## Usage
//!
//! ### Start a coordinator
//! ```bash
//! minidfs master --port 8000 --chunkSize 1048576
//! ```
//!
//! ### Start chunkservers
//! ```bash
//! minidfs chunkserver --port 8001 --master http://localhost:8000 --dir ./cs1
//! minidfs chunkserver --port 8002 --master http://localhost:8000 --dir ./cs2
//! ```
//!
//! ### Store and fetch a file
//! ```bash
//! minidfs client --master http://localhost:8000 --action write --filename ./photo.jpg
//! minidfs client --master http://localhost:8000 --action read \
//!   --filename ./photo.jpg --output-filename ./copy.jpg
//! ```

pub mod chunkserver;
pub mod client;
pub mod common;
pub mod coordinator;

// Re-export commonly used types
pub use chunkserver::ChunkserverServer;
pub use client::{Client, DownloadReport, UploadReport};
pub use common::{Config, Error, Result};
pub use coordinator::Coordinator;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
