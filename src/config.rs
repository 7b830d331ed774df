//! TOML configuration for a pool client instance.

use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use alloy::primitives::Address;
use serde::Deserialize;
use thiserror::Error;

/// Default tree depth, matching the deployed pool (capacity 2^20).
pub const DEFAULT_TREE_DEPTH: u32 = 20;

/// Default per-request block span for deposit log scans.
pub const DEFAULT_EVENT_CHUNK_SIZE: u64 = 50_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Unreadable(#[source] std::io::Error),

    #[error("config file invalid: {0}")]
    Invalid(#[from] toml::de::Error),
}

/// Client configuration, one pool instance per file.
///
/// `MERKLE_TREE_FILE` and `EVENT_CHUNK_SIZE` environment variables override
/// their file counterparts, so syncs can be pointed at an alternate state
/// file without editing config.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub rpc_url: String,
    pub pool_address: Address,
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_chunk_size")]
    pub event_chunk_size: u64,
    /// First block to scan for deposit events; set to the pool's
    /// deployment block to keep syncs cheap.
    #[serde(default)]
    pub start_block: u64,
    #[serde(default = "default_prover_timeout_secs")]
    pub prover_timeout_secs: u64,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("merkle-tree-data.json")
}

fn default_depth() -> u32 {
    DEFAULT_TREE_DEPTH
}

fn default_chunk_size() -> u64 {
    DEFAULT_EVENT_CHUNK_SIZE
}

fn default_prover_timeout_secs() -> u64 {
    120
}

impl PoolConfig {
    /// Load from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Unreadable)?;
        let mut config: Self = toml::from_str(&raw)?;
        if let Ok(state_path) = std::env::var("MERKLE_TREE_FILE") {
            config.state_path = PathBuf::from(state_path);
        }
        if let Ok(chunk) = std::env::var("EVENT_CHUNK_SIZE") {
            if let Ok(parsed) = chunk.parse() {
                config.event_chunk_size = parsed;
            }
        }
        Ok(config)
    }

    pub fn prover_timeout(&self) -> Duration {
        Duration::from_secs(self.prover_timeout_secs)
    }
}
