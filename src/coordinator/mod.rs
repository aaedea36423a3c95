//! Coordinator implementation
//!
//! The coordinator is responsible for:
//! - Chunkserver registry
//! - File metadata (file → chunks → replica locations)
//! - Upload plans and read plans
//!
//! All state is in memory and lost on restart.

pub mod client;
pub mod http;
pub mod metadata;
pub mod placement;
pub mod server;

pub use client::CoordinatorClient;
pub use server::Coordinator;
