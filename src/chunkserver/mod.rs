//! Chunkserver implementation
//!
//! A chunkserver stores chunk bytes as plain files, serves them back by
//! chunk identifier, and reports every stored chunk to the coordinator.

pub mod client;
pub mod http;
pub mod server;
pub mod store;

pub use client::ChunkserverClient;
pub use server::ChunkserverServer;
pub use store::ChunkStore;
