//! Quorum coordinator
//!
//! The coordinator is responsible for:
//! - Replica selection per key (HRW placement)
//! - Concurrent read/write fan-out with per-replica deadlines
//! - Quorum accounting (R reads, W writes) with fail-fast
//! - Reconciling divergent replica values
//! - Scheduling read-repair for stale replicas

pub mod placement;
pub mod quorum;
pub mod reconcile;
pub mod replica_client;

pub use placement::PlacementManager;
pub use quorum::{Coordinator, GetValue, QuorumConfig};
pub use reconcile::{reconcile, Reconciled};
pub use replica_client::{ReplicaClient, ReplicaError};
