//! # quorumkv
//!
//! The quorum coordination core of a replicated key-value store:
//! - N/R/W replication with validated, immutable replication specs
//! - Concurrent fan-out reads/writes with fail-fast quorum accounting
//! - Deterministic reconciliation of divergent replica values
//! - Asynchronous read-repair of stale replicas
//! - A tagged, forward-compatible request/response envelope
//!
//! ## Architecture
//!
//! ```text
//!               ┌──────────────────────────────┐
//!               │         Coordinator          │
//!               │  (per-call fan-out state)    │
//!               └──────┬───────┬───────┬───────┘
//!                      │       │       │  ReplicaClient (trait)
//!                ┌─────▼─┐ ┌───▼───┐ ┌─▼─────┐
//!                │ Rep A │ │ Rep B │ │ Rep C │
//!                │ get/  │ │ get/  │ │ get/  │
//!                │ put   │ │ put   │ │ put   │
//!                └───────┘ └───────┘ └───────┘
//! ```
//!
//! A read fans out to all N replicas of the key, succeeds once R of them
//! answer, reconciles the answers by version, and repairs stale replicas in
//! the background. A write succeeds once W replicas acknowledge. Both paths
//! give up early as soon as quorum becomes arithmetically impossible.
//!
//! Transport, membership discovery, and durable storage are collaborators
//! behind traits; the crate ships an in-process cluster ([`LocalCluster`])
//! for tests and embedding.
//!
//! ## Usage
//!
//! ```no_run
//! use quorumkv::{Coordinator, LocalCluster, QuorumConfig};
//! use std::sync::Arc;
//!
//! # async fn demo() -> quorumkv::Result<()> {
//! let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
//! let coord = Coordinator::new(cluster.replica_ids(), cluster, QuorumConfig::default());
//!
//! let version = coord.put(b"greeting".as_ref(), b"hello".as_ref()).await?;
//! let hit = coord.get(b"greeting".as_ref()).await?.expect("just written");
//! assert_eq!(hit.value.as_ref(), b"hello");
//! assert_eq!(hit.version, version);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod coordinator;
pub mod ops;
pub mod protocol;
pub mod replica;

// Re-export commonly used types
pub use client::Entry;
pub use common::{CoordinatorConfig, Error, ReplicaId, Result};
pub use coordinator::{Coordinator, GetValue, QuorumConfig, ReplicaClient, ReplicaError};
pub use protocol::{GetRequest, PutRequest, ReplicationSpec, Versioned};
pub use replica::LocalCluster;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
