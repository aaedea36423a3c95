//! Configuration for minidfs components
//!
//! Values come from an optional TOML file layered with `MINIDFS__*`
//! environment variables; command-line flags override both.

use crate::common::{Error, Result, MAX_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name (without extension) looked up in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "minidfs";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Coordinator-specific config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator: Option<CoordinatorConfig>,

    /// Chunkserver-specific config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunkserver: Option<ChunkserverConfig>,

    /// Client-specific config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinator: None,
            chunkserver: None,
            client: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `minidfs.toml` in the working
    /// directory if it exists, then apply `MINIDFS__SECTION__KEY` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        builder = match path {
            Some(path) => builder.add_source(::config::File::from(path)),
            None => builder
                .add_source(::config::File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };
        builder = builder.add_source(
            ::config::Environment::with_prefix("MINIDFS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

/// Which chunkserver/replica a placement decision picks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementPolicy {
    /// Uniformly random, no locality or load awareness
    #[default]
    UniformRandom,
    /// Cycle through candidates
    RoundRobin,
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_coordinator_bind")]
    pub bind_addr: SocketAddr,

    /// Fixed chunk size in bytes, at most `MAX_CHUNK_SIZE`
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Replica selection for read plans
    #[serde(default)]
    pub placement: PlacementPolicy,
}

fn default_coordinator_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}
fn default_chunk_size() -> u64 {
    1024 * 1024
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_coordinator_bind(),
            chunk_size: default_chunk_size(),
            placement: PlacementPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "chunk size must be greater than zero".into(),
            ));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "chunk size {} exceeds the maximum of {} bytes",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        Ok(())
    }
}

/// Chunkserver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkserverConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_chunkserver_bind")]
    pub bind_addr: SocketAddr,

    /// Base URL of the coordinator, e.g. `http://localhost:8000`
    #[serde(default = "default_coordinator_url")]
    pub coordinator_url: String,

    /// Directory chunk files are stored in
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address announced to the coordinator. Discovered from the outbound
    /// interface and the bound port when unset.
    #[serde(default)]
    pub advertise_addr: Option<String>,

    /// Largest accepted chunk in bytes. Multipart framing comes on top.
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: u64,

    /// Timeout for calls to the coordinator
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_chunkserver_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8001))
}
fn default_coordinator_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_max_chunk_bytes() -> u64 {
    MAX_CHUNK_SIZE
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ChunkserverConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_chunkserver_bind(),
            coordinator_url: default_coordinator_url(),
            data_dir: default_data_dir(),
            advertise_addr: None,
            max_chunk_bytes: default_max_chunk_bytes(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ChunkserverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.coordinator_url)?;
        validate_timeout(self.request_timeout_ms)?;
        if self.max_chunk_bytes == 0 {
            return Err(Error::InvalidConfig(
                "max chunk upload size must be greater than zero".into(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("data directory cannot be empty".into()));
        }
        Ok(())
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the coordinator
    #[serde(default = "default_coordinator_url")]
    pub coordinator_url: String,

    /// Timeout for every request to the coordinator or a chunkserver
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Chunkserver choice for each uploaded chunk
    #[serde(default)]
    pub placement: PlacementPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            coordinator_url: default_coordinator_url(),
            request_timeout_ms: default_request_timeout_ms(),
            placement: PlacementPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.coordinator_url)?;
        validate_timeout(self.request_timeout_ms)
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(Error::InvalidConfig("coordinator url cannot be empty".into()));
    }
    Ok(())
}

fn validate_timeout(timeout_ms: u64) -> Result<()> {
    if timeout_ms == 0 {
        return Err(Error::InvalidConfig(
            "request timeout must be greater than zero".into(),
        ));
    }
    Ok(())
}
