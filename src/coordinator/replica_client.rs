//! Client contract for talking to one replica
//!
//! Transport implementations live behind this trait (the crate ships an
//! in-process one in `replica::local`). Failures are typed so the
//! coordinator can count them toward its fail-fast arithmetic instead of
//! unwinding.

use crate::common::ReplicaId;
use crate::protocol::{GetRequest, GetResponse, PutRequest, PutResponse};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Per-replica transport failure. Absorbed and counted by the coordinator,
/// never surfaced individually to the caller.
#[derive(Debug, Clone, Error)]
pub enum ReplicaError {
    #[error("Replica {replica} timed out")]
    Timeout { replica: ReplicaId },

    #[error("Replica {replica} unreachable: {reason}")]
    Unreachable { replica: ReplicaId, reason: String },
}

impl ReplicaError {
    pub fn replica(&self) -> &ReplicaId {
        match self {
            ReplicaError::Timeout { replica } => replica,
            ReplicaError::Unreachable { replica, .. } => replica,
        }
    }
}

pub type ReplicaResult<T> = std::result::Result<T, ReplicaError>;

/// Sends a single request to one named replica.
///
/// Implementations do not enforce deadlines themselves; callers bound each
/// send with [`get_with_timeout`] / [`put_with_timeout`].
#[async_trait]
pub trait ReplicaClient: Send + Sync + 'static {
    async fn get(&self, replica: &ReplicaId, request: GetRequest) -> ReplicaResult<GetResponse>;

    async fn put(&self, replica: &ReplicaId, request: PutRequest) -> ReplicaResult<PutResponse>;
}

/// Bound a get with a caller-supplied deadline; expiry becomes
/// [`ReplicaError::Timeout`].
pub async fn get_with_timeout<C: ReplicaClient + ?Sized>(
    client: &C,
    replica: &ReplicaId,
    request: GetRequest,
    timeout: Duration,
) -> ReplicaResult<GetResponse> {
    match tokio::time::timeout(timeout, client.get(replica, request)).await {
        Ok(result) => result,
        Err(_) => Err(ReplicaError::Timeout {
            replica: replica.clone(),
        }),
    }
}

/// Bound a put with a caller-supplied deadline; expiry becomes
/// [`ReplicaError::Timeout`].
pub async fn put_with_timeout<C: ReplicaClient + ?Sized>(
    client: &C,
    replica: &ReplicaId,
    request: PutRequest,
    timeout: Duration,
) -> ReplicaResult<PutResponse> {
    match tokio::time::timeout(timeout, client.put(replica, request)).await {
        Ok(result) => result,
        Err(_) => Err(ReplicaError::Timeout {
            replica: replica.clone(),
        }),
    }
}
