//! Quorum read/write coordination
//!
//! One call owns its fan-out state for its whole lifetime; nothing is
//! shared across concurrent calls, so the coordinator is `&self` all the
//! way down and needs no locking.

use crate::common::{CoordinatorConfig, ReplicaId, Result, VersionClock};
use crate::coordinator::placement::PlacementManager;
use crate::coordinator::reconcile::reconcile;
use crate::coordinator::replica_client::{
    get_with_timeout, put_with_timeout, ReplicaClient, ReplicaError,
};
use crate::protocol::{GetRequest, PutRequest, ReplicationSpec, Versioned};
use bytes::Bytes;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Coordinator-level knobs for one cluster.
#[derive(Debug, Clone)]
pub struct QuorumConfig {
    /// Default N/R/W when a call does not supply its own
    pub replication: ReplicationSpec,
    /// Deadline for each replica call
    pub replica_timeout: Duration,
    /// Deadline for a whole get/put
    pub call_timeout: Duration,
    /// Repair stale replicas discovered during reads
    pub read_repair: bool,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            replication: ReplicationSpec::default(),
            replica_timeout: Duration::from_secs(1),
            call_timeout: Duration::from_secs(5),
            read_repair: true,
        }
    }
}

impl QuorumConfig {
    /// Validate a file-level [`CoordinatorConfig`] into quorum knobs.
    pub fn from_config(config: &CoordinatorConfig) -> Result<Self> {
        Ok(Self {
            replication: config.replication()?,
            replica_timeout: config.replica_timeout(),
            call_timeout: config.call_timeout(),
            read_repair: config.read_repair,
        })
    }
}

/// A found value and the version it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetValue {
    pub value: Bytes,
    pub version: u64,
}

/// Quorum coordinator.
///
/// Generic over `C: ReplicaClient`; production wires a network transport,
/// tests and embedded use wire [`crate::LocalCluster`].
pub struct Coordinator<C: ReplicaClient> {
    placement: PlacementManager,
    client: Arc<C>,
    config: QuorumConfig,
    clock: VersionClock,
}

impl<C: ReplicaClient> Coordinator<C> {
    pub fn new(replicas: Vec<ReplicaId>, client: Arc<C>, config: QuorumConfig) -> Self {
        Self {
            placement: PlacementManager::new(replicas),
            client,
            config,
            clock: VersionClock::new(),
        }
    }

    /// Build a coordinator from a loaded configuration file.
    pub fn from_config(config: &CoordinatorConfig, client: Arc<C>) -> Result<Self> {
        Ok(Self::new(
            config.replicas.clone(),
            client,
            QuorumConfig::from_config(config)?,
        ))
    }

    pub fn config(&self) -> &QuorumConfig {
        &self.config
    }

    /// Read a key with the default replication spec.
    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<GetValue>> {
        self.get_with(key, self.config.replication).await
    }

    /// Read a key: fan out to its N replicas, succeed at R responses,
    /// reconcile, and schedule read-repair for stale replicas.
    ///
    /// `Ok(None)` means the quorum agrees the key does not exist (missing
    /// everywhere, or the winning record is a tombstone).
    pub async fn get_with(
        &self,
        key: impl AsRef<[u8]>,
        spec: ReplicationSpec,
    ) -> Result<Option<GetValue>> {
        if key.as_ref().is_empty() {
            return Err(crate::Error::EmptyKey);
        }
        let key = Bytes::copy_from_slice(key.as_ref());
        let n = spec.n() as usize;
        let need = spec.r() as usize;

        let replicas = self.placement.replica_set(&key, n)?;
        let replica_timeout = self.config.replica_timeout;

        let mut calls = FanOut::new();
        for replica in replicas {
            let client = self.client.clone();
            let request = GetRequest::new(key.clone()).with_spec(spec);
            calls.spawn(async move {
                let result =
                    get_with_timeout(client.as_ref(), &replica, request, replica_timeout).await;
                (replica, result)
            });
        }

        let responses = calls
            .collect_quorum(n, need, self.config.call_timeout, |response| {
                response.versioned()
            })
            .await?;

        // R >= 1, so the response set is never empty here
        let reconciled = reconcile(&responses)
            .ok_or_else(|| crate::Error::Internal("empty read quorum".into()))?;

        if self.config.read_repair && !reconciled.stale.is_empty() {
            tracing::debug!(
                stale = reconciled.stale.len(),
                version = reconciled.winner.version,
                "scheduling read-repair"
            );
            // Detached: its outcome must not affect the answer below.
            let _ = crate::ops::repair::spawn_read_repair(
                self.client.clone(),
                key,
                reconciled.winner.clone(),
                reconciled.stale,
                spec,
                replica_timeout,
            );
        }

        Ok(match reconciled.winner {
            Versioned {
                value: Some(value),
                version,
            } => Some(GetValue { value, version }),
            _ => None,
        })
    }

    /// Write a value with the default replication spec. Returns the
    /// version assigned to the write.
    pub async fn put(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>) -> Result<u64> {
        self.put_with(key, value, self.config.replication).await
    }

    /// Write a value: fan out to all N replicas, succeed at W acks.
    pub async fn put_with(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        spec: ReplicationSpec,
    ) -> Result<u64> {
        self.write(key.as_ref(), Some(value.into()), spec).await
    }

    /// Delete a key by writing a tombstone to W replicas.
    pub async fn delete(&self, key: impl AsRef<[u8]>) -> Result<u64> {
        self.delete_with(key, self.config.replication).await
    }

    pub async fn delete_with(&self, key: impl AsRef<[u8]>, spec: ReplicationSpec) -> Result<u64> {
        self.write(key.as_ref(), None, spec).await
    }

    async fn write(&self, key: &[u8], value: Option<Bytes>, spec: ReplicationSpec) -> Result<u64> {
        if key.is_empty() {
            return Err(crate::Error::EmptyKey);
        }
        let key = Bytes::copy_from_slice(key);
        let n = spec.n() as usize;
        let need = spec.w() as usize;
        let version = self.clock.next();

        let replicas = self.placement.replica_set(&key, n)?;
        let replica_timeout = self.config.replica_timeout;

        let mut calls = FanOut::new();
        for replica in replicas {
            let client = self.client.clone();
            let request = PutRequest::new(key.clone(), value.clone(), version).with_spec(spec);
            calls.spawn(async move {
                let result =
                    put_with_timeout(client.as_ref(), &replica, request, replica_timeout).await;
                (replica, result)
            });
        }

        calls
            .collect_quorum(n, need, self.config.call_timeout, |_ack| ())
            .await?;

        Ok(version)
    }
}

/// Call-local fan-out state: one spawned task per replica, aborted
/// (best-effort) as soon as the call's termination condition fires.
struct FanOut<T: Send + 'static> {
    tasks: FuturesUnordered<JoinHandle<(ReplicaId, std::result::Result<T, ReplicaError>)>>,
}

impl<T: Send + 'static> FanOut<T> {
    fn new() -> Self {
        Self {
            tasks: FuturesUnordered::new(),
        }
    }

    fn spawn<F>(&mut self, call: F)
    where
        F: std::future::Future<Output = (ReplicaId, std::result::Result<T, ReplicaError>)>
            + Send
            + 'static,
    {
        self.tasks.push(tokio::spawn(call));
    }

    /// Collect responses in arrival order until either `need` successes
    /// (success) or quorum becomes arithmetically impossible (fail-fast:
    /// `n - failures < need`), whichever comes first. The whole collection
    /// is bounded by `call_timeout`.
    async fn collect_quorum<U>(
        mut self,
        n: usize,
        need: usize,
        call_timeout: Duration,
        mut on_success: impl FnMut(T) -> U,
    ) -> Result<Vec<(ReplicaId, U)>> {
        let deadline = Instant::now() + call_timeout;
        let mut collected = Vec::with_capacity(need);
        let mut failures = 0usize;

        let outcome = loop {
            if collected.len() >= need {
                break Ok(());
            }
            if n - failures < need {
                break Err(crate::Error::QuorumUnreachable {
                    have: collected.len(),
                    need,
                });
            }

            match tokio::time::timeout_at(deadline, self.tasks.next()).await {
                Ok(Some(Ok((replica, Ok(response))))) => {
                    collected.push((replica, on_success(response)));
                }
                Ok(Some(Ok((_, Err(e))))) => {
                    tracing::debug!(replica = %e.replica(), error = %e, "replica call failed");
                    failures += 1;
                }
                Ok(Some(Err(join_error))) => {
                    // A panicked or aborted task counts as a failed replica
                    tracing::debug!(error = %join_error, "replica task aborted");
                    failures += 1;
                }
                // Every task finished without reaching quorum, or the
                // whole-call deadline expired.
                Ok(None) | Err(_) => {
                    break Err(crate::Error::QuorumUnreachable {
                        have: collected.len(),
                        need,
                    });
                }
            }
        };

        // Cancel whatever is still in flight; nobody is waiting for it.
        for task in self.tasks.iter() {
            task.abort();
        }

        outcome.map(|_| collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::{Fault, LocalCluster, ReplicaStore};

    fn coordinator(cluster: &Arc<LocalCluster>) -> Coordinator<LocalCluster> {
        Coordinator::new(
            cluster.replica_ids(),
            cluster.clone(),
            QuorumConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        let version = coord.put(b"greeting", b"hello".as_ref()).await.unwrap();
        let hit = coord.get(b"greeting").await.unwrap().unwrap();

        assert_eq!(hit.value.as_ref(), b"hello");
        assert_eq!(hit.version, version);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        assert!(matches!(
            coord.get(b"").await.unwrap_err(),
            crate::Error::EmptyKey
        ));
        assert!(matches!(
            coord.put(b"", b"v".as_ref()).await.unwrap_err(),
            crate::Error::EmptyKey
        ));
        assert!(matches!(
            coord.delete(b"").await.unwrap_err(),
            crate::Error::EmptyKey
        ));
    }

    #[tokio::test]
    async fn test_get_unknown_key() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        assert_eq!(coord.get(b"never-written").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_returns_not_found() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        coord.put(b"k", b"v".as_ref()).await.unwrap();
        coord.delete(b"k").await.unwrap();

        // All replicas hold tombstones; that is "not found", not an error
        assert_eq!(coord.get(b"k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_versions_increase_across_writes() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        let v1 = coord.put(b"k", b"first".as_ref()).await.unwrap();
        let v2 = coord.put(b"k", b"second".as_ref()).await.unwrap();
        assert!(v2 > v1);

        let hit = coord.get(b"k").await.unwrap().unwrap();
        assert_eq!(hit.value.as_ref(), b"second");
        assert_eq!(hit.version, v2);
    }

    #[tokio::test]
    async fn test_read_survives_minimum_quorum() {
        // N=3, R=2: exactly one failed replica is the boundary case
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        coord.put(b"k", b"v".as_ref()).await.unwrap();
        cluster.inject_fault("rep-2", Fault::Unreachable);

        let hit = coord.get(b"k").await.unwrap().unwrap();
        assert_eq!(hit.value.as_ref(), b"v");
    }

    #[tokio::test]
    async fn test_read_quorum_unreachable() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        coord.put(b"k", b"v".as_ref()).await.unwrap();
        cluster.inject_fault("rep-1", Fault::Unreachable);
        cluster.inject_fault("rep-2", Fault::Unreachable);

        let err = coord.get(b"k").await.unwrap_err();
        // `have` depends on whether the healthy reply beat the fail-fast
        match err {
            crate::Error::QuorumUnreachable { have, need } => {
                assert!(have <= 1);
                assert_eq!(need, 2);
            }
            other => panic!("expected QuorumUnreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_quorum_unreachable() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        cluster.inject_fault("rep-1", Fault::Unreachable);
        cluster.inject_fault("rep-2", Fault::Unreachable);

        let err = coord.put(b"k", b"v".as_ref()).await.unwrap_err();
        assert!(matches!(err, crate::Error::QuorumUnreachable { need: 2, .. }));
    }

    #[tokio::test]
    async fn test_single_replica_spec() {
        let cluster = Arc::new(LocalCluster::new(["rep-1"]));
        let coord = coordinator(&cluster);
        let spec = ReplicationSpec::new(1, 1, 1).unwrap();

        coord.put_with(b"k", b"v".as_ref(), spec).await.unwrap();
        let hit = coord.get_with(b"k", spec).await.unwrap().unwrap();
        assert_eq!(hit.value.as_ref(), b"v");
    }

    #[tokio::test]
    async fn test_too_few_replicas_for_spec() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2"]));
        let coord = coordinator(&cluster);

        let err = coord.get(b"k").await.unwrap_err();
        assert!(matches!(err, crate::Error::InsufficientReplicas { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_fast_beats_slow_replica() {
        // Two of three replicas unreachable makes R=2 impossible; the call
        // must fail without waiting out the third replica's delay.
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        coord.put(b"k", b"v".as_ref()).await.unwrap();
        let mut slow = None;
        for id in cluster.replica_ids() {
            if slow.is_none() {
                cluster.inject_fault(&id, Fault::Delay(Duration::from_secs(3600)));
                slow = Some(id);
            } else {
                cluster.inject_fault(&id, Fault::Unreachable);
            }
        }

        let started = Instant::now();
        let err = coord.get(b"k").await.unwrap_err();
        assert!(matches!(err, crate::Error::QuorumUnreachable { .. }));
        // Far below both the hour-long delay and the whole-call deadline
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_read_repair_fixes_stale_replica() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = coordinator(&cluster);

        // Write while one replica is partitioned away (W=2 still succeeds)
        let stale_id = cluster.replica_ids().remove(0);
        cluster.inject_fault(&stale_id, Fault::Unreachable);
        let version = coord.put(b"k", b"fresh".as_ref()).await.unwrap();
        cluster.clear_fault(&stale_id);

        let store = cluster.store(&stale_id).unwrap();
        assert!(store.get(b"k").is_missing());

        // Read with R=N so the stale replica is guaranteed to be in the quorum
        let spec = ReplicationSpec::new(3, 3, 2).unwrap();
        let hit = coord.get_with(b"k", spec).await.unwrap().unwrap();
        assert_eq!(hit.value.as_ref(), b"fresh");
        assert_eq!(hit.version, version);

        // The stale replica converges once the detached repair lands
        for _ in 0..50 {
            if store.get(b"k").version == version {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.get(b"k"), Versioned::value(b"fresh".as_ref(), version));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_coordinator() {
        let cluster = Arc::new(LocalCluster::new(["rep-1", "rep-2", "rep-3"]));
        let coord = Arc::new(coordinator(&cluster));

        let mut handles = Vec::new();
        for i in 0..16u32 {
            let coord = coord.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("key-{}", i);
                coord.put(key.as_bytes(), format!("value-{}", i)).await?;
                coord.get(key.as_bytes()).await
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let hit = handle.await.unwrap().unwrap().unwrap();
            assert_eq!(hit.value.as_ref(), format!("value-{}", i).as_bytes());
        }
    }
}
