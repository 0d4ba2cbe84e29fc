//! Per-replica storage and the in-process cluster transport
//!
//! Each replica exposes a simple versioned get/apply capability; durable
//! backends live outside this crate. [`LocalCluster`] wires a set of
//! in-memory replicas behind the `ReplicaClient` trait so the coordinator
//! can be exercised end-to-end without a network.

pub mod local;
pub mod store;

pub use local::{Fault, LocalCluster};
pub use store::{MemStore, ReplicaStore};
