//! Hashing utilities for quorumkv
//!
//! - BLAKE3 for key digests
//! - HRW (Highest Random Weight) for replica placement
//!
//! Keys are opaque byte sequences; nothing here assumes UTF-8.

use crate::common::ReplicaId;

/// Compute BLAKE3 hash of data, return hex string
pub fn blake3_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("{}", hash)
}

/// HRW (Highest Random Weight) hashing for replica placement
///
/// Given a key and a set of replicas, returns the replicas sorted by their
/// weight (deterministic based on key). This keeps placement stable even as
/// the cluster changes.
pub fn hrw_hash(key: &[u8], replicas: &[ReplicaId]) -> Vec<ReplicaId> {
    let mut weights: Vec<(ReplicaId, u64)> = replicas
        .iter()
        .map(|replica| {
            let mut hasher = blake3::Hasher::new();
            hasher.update(key);
            hasher.update(replica.as_bytes());
            let hash = hasher.finalize();
            let weight = u64::from_le_bytes(hash.as_bytes()[0..8].try_into().unwrap());
            (replica.clone(), weight)
        })
        .collect();

    // Sort by weight (descending); replica id breaks exact ties
    weights.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    weights.into_iter().map(|(replica, _)| replica).collect()
}

/// Select the N replicas responsible for a key using HRW hashing
pub fn select_replicas(key: &[u8], replicas: &[ReplicaId], n: usize) -> Vec<ReplicaId> {
    let sorted = hrw_hash(key, replicas);
    sorted.into_iter().take(n).collect()
}
