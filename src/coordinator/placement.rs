//! Replica selection via HRW hashing
//!
//! Membership is external input: the manager holds whatever replica ids the
//! discovery layer handed it. The replica set for a key is computed per
//! call and never cached inside a request.

use crate::common::{select_replicas, ReplicaId, Result};

/// PlacementManager maps keys to their N responsible replicas.
pub struct PlacementManager {
    /// Known replica identifiers
    replicas: Vec<ReplicaId>,
}

impl PlacementManager {
    pub fn new(replicas: Vec<ReplicaId>) -> Self {
        Self { replicas }
    }

    /// Select the N replicas for a key.
    pub fn replica_set(&self, key: &[u8], n: usize) -> Result<Vec<ReplicaId>> {
        if self.replicas.is_empty() {
            return Err(crate::Error::NoHealthyReplicas);
        }

        let selected = select_replicas(key, &self.replicas, n);

        if selected.len() < n {
            return Err(crate::Error::InsufficientReplicas {
                needed: n,
                available: selected.len(),
            });
        }

        Ok(selected)
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }
}
