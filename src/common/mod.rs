//! Common utilities and types shared across quorumkv

pub mod clock;
pub mod config;
pub mod error;
pub mod hash;

pub use clock::{timestamp_now_millis, VersionClock};
pub use config::CoordinatorConfig;
pub use error::{Error, Result};
pub use hash::{blake3_hash, hrw_hash, select_replicas};

/// Identifier of a single replica, assigned by the (external) membership layer.
pub type ReplicaId = String;

/// Initialize tracing with an env-filter (`RUST_LOG`), falling back to `info`.
///
/// Intended for binaries and tests embedding the coordinator; libraries
/// should leave subscriber installation to their host.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
