//! Read-repair: push the winning record to stale replicas
//!
//! Fired after a successful quorum read for every replica that answered
//! with a strictly older version. Best-effort by contract: the caller has
//! already been answered, so failures here are logged and counted, never
//! propagated.

use crate::common::ReplicaId;
use crate::coordinator::replica_client::{put_with_timeout, ReplicaClient};
use crate::protocol::{PutRequest, ReplicationSpec, Versioned};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepairReport {
    pub replicas_repaired: usize,
    pub replicas_failed: usize,
}

/// Write `winner` (at its original version, so the write is idempotent) to
/// each stale replica.
pub async fn read_repair<C: ReplicaClient + ?Sized>(
    client: &C,
    key: Bytes,
    winner: Versioned,
    stale: Vec<ReplicaId>,
    spec: ReplicationSpec,
    timeout: Duration,
) -> RepairReport {
    let mut report = RepairReport::default();

    for replica in stale {
        let request = PutRequest::new(key.clone(), winner.value.clone(), winner.version)
            .with_spec(spec);

        match put_with_timeout(client, &replica, request, timeout).await {
            Ok(ack) => {
                tracing::debug!(
                    replica = %replica,
                    version = winner.version,
                    applied = ack.applied,
                    "read-repair write"
                );
                report.replicas_repaired += 1;
            }
            Err(e) => {
                tracing::warn!(replica = %replica, error = %e, "read-repair write failed");
                report.replicas_failed += 1;
            }
        }
    }

    report
}

/// Detach a read-repair pass. The handle is returned for tests; production
/// callers drop it.
pub fn spawn_read_repair<C: ReplicaClient>(
    client: Arc<C>,
    key: Bytes,
    winner: Versioned,
    stale: Vec<ReplicaId>,
    spec: ReplicationSpec,
    timeout: Duration,
) -> JoinHandle<RepairReport> {
    tokio::spawn(async move {
        read_repair(client.as_ref(), key, winner, stale, spec, timeout).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::{Fault, LocalCluster, ReplicaStore};

    #[tokio::test]
    async fn test_repairs_stale_replica() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2"]));
        cluster
            .store("rep-1")
            .unwrap()
            .apply(b"k", Versioned::value(b"old".as_ref(), 2));

        let winner = Versioned::value(b"new".as_ref(), 9);
        let report = read_repair(
            cluster.as_ref(),
            Bytes::from_static(b"k"),
            winner.clone(),
            vec!["rep-1".to_string(), "rep-2".to_string()],
            ReplicationSpec::default(),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(report.replicas_repaired, 2);
        assert_eq!(report.replicas_failed, 0);
        assert_eq!(cluster.store("rep-1").unwrap().get(b"k"), winner);
        assert_eq!(cluster.store("rep-2").unwrap().get(b"k"), winner);
    }

    #[tokio::test]
    async fn test_failures_counted_not_raised() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2"]));
        cluster.inject_fault("rep-2", Fault::Unreachable);

        let report = read_repair(
            cluster.as_ref(),
            Bytes::from_static(b"k"),
            Versioned::value(b"v".as_ref(), 5),
            vec!["rep-1".to_string(), "rep-2".to_string()],
            ReplicationSpec::default(),
            Duration::from_secs(1),
        )
        .await;

        assert_eq!(report.replicas_repaired, 1);
        assert_eq!(report.replicas_failed, 1);
    }

    #[tokio::test]
    async fn test_spawned_repair_completes() {
        let cluster = Arc::new(LocalCluster::new(["rep-1"]));

        let handle = spawn_read_repair(
            cluster.clone(),
            Bytes::from_static(b"k"),
            Versioned::tombstone(4),
            vec!["rep-1".to_string()],
            ReplicationSpec::default(),
            Duration::from_secs(1),
        );

        let report = handle.await.unwrap();
        assert_eq!(report.replicas_repaired, 1);
        assert!(cluster.store("rep-1").unwrap().get(b"k").is_tombstone());
    }
}
