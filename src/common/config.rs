//! Configuration for the quorum coordinator

use crate::common::{ReplicaId, Result};
use crate::protocol::ReplicationSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Coordinator configuration
///
/// Timeouts are configuration inputs, never hardcoded in the call paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Known replica identifiers (supplied by the membership layer)
    #[serde(default)]
    pub replicas: Vec<ReplicaId>,

    /// Default replica count per key
    #[serde(default = "default_n")]
    pub n: u8,

    /// Default read quorum
    #[serde(default = "default_r")]
    pub r: u8,

    /// Default write quorum
    #[serde(default = "default_w")]
    pub w: u8,

    /// Per-replica request timeout
    #[serde(default = "default_replica_timeout_ms")]
    pub replica_timeout_ms: u64,

    /// Whole-call deadline for a single get/put
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Repair stale replicas discovered during reads
    #[serde(default = "default_read_repair")]
    pub read_repair: bool,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_n() -> u8 {
    3
}
fn default_r() -> u8 {
    2
}
fn default_w() -> u8 {
    2
}
fn default_replica_timeout_ms() -> u64 {
    1_000
}
fn default_call_timeout_ms() -> u64 {
    5_000
}
fn default_read_repair() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            replicas: Vec::new(),
            n: default_n(),
            r: default_r(),
            w: default_w(),
            replica_timeout_ms: default_replica_timeout_ms(),
            call_timeout_ms: default_call_timeout_ms(),
            read_repair: default_read_repair(),
            log_level: default_log_level(),
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from a TOML file, applying defaults for missing keys.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))
    }

    /// Validate the configured N/R/W into a replication spec.
    pub fn replication(&self) -> Result<ReplicationSpec> {
        ReplicationSpec::new(self.n, self.r, self.w)
    }

    pub fn replica_timeout(&self) -> Duration {
        Duration::from_millis(self.replica_timeout_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}
