//! In-process cluster: a `ReplicaClient` over named in-memory replicas
//!
//! Every call crosses the wire codec (encode at the coordinator side,
//! decode at the replica, and back), so the serialization boundary is
//! exercised even without a network. Faults can be injected per replica to
//! simulate partitions and slow nodes.

use crate::common::{Error, ReplicaId, Result};
use crate::coordinator::replica_client::{ReplicaClient, ReplicaError, ReplicaResult};
use crate::protocol::codec::{decode_request, decode_response, encode_request, encode_response};
use crate::protocol::{GetRequest, GetResponse, PutRequest, PutResponse, Request, Response};
use crate::replica::store::{MemStore, ReplicaStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Injectable failure mode for one replica.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Every request fails immediately.
    Unreachable,
    /// Every request is served after a fixed delay.
    Delay(Duration),
}

/// A set of in-memory replicas reachable through `ReplicaClient`.
pub struct LocalCluster {
    replicas: HashMap<ReplicaId, Arc<MemStore>>,
    faults: Mutex<HashMap<ReplicaId, Fault>>,
}

impl LocalCluster {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ReplicaId>,
    {
        let replicas = ids
            .into_iter()
            .map(|id| (id.into(), Arc::new(MemStore::new())))
            .collect();
        Self {
            replicas,
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// All replica ids, sorted for deterministic placement input.
    pub fn replica_ids(&self) -> Vec<ReplicaId> {
        let mut ids: Vec<ReplicaId> = self.replicas.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Direct handle to one replica's store (tests peek and pre-seed state).
    pub fn store(&self, replica: &str) -> Option<Arc<MemStore>> {
        self.replicas.get(replica).cloned()
    }

    pub fn inject_fault(&self, replica: &str, fault: Fault) {
        self.faults
            .lock()
            .unwrap()
            .insert(replica.to_string(), fault);
    }

    pub fn clear_fault(&self, replica: &str) {
        self.faults.lock().unwrap().remove(replica);
    }

    fn fault_for(&self, replica: &str) -> Option<Fault> {
        self.faults.lock().unwrap().get(replica).cloned()
    }

    /// Replica-side dispatch: decode the frame, serve it, encode the answer.
    fn serve(&self, replica: &ReplicaId, frame: &[u8]) -> Result<Bytes> {
        let store = self
            .replicas
            .get(replica)
            .ok_or_else(|| Error::Other(format!("unknown replica: {}", replica)))?;

        let response = match decode_request(frame)? {
            Request::Get(get) => Response::Get(store.get(&get.key).into()),
            Request::Put(put) => {
                let record = crate::protocol::Versioned {
                    value: put.value,
                    version: put.version,
                };
                let applied = store.apply(&put.key, record);
                Response::Put(PutResponse {
                    version: put.version,
                    applied,
                })
            }
        };

        encode_response(&response)
    }

    async fn exchange(&self, replica: &ReplicaId, request: Request) -> ReplicaResult<Response> {
        match self.fault_for(replica) {
            Some(Fault::Unreachable) => {
                return Err(ReplicaError::Unreachable {
                    replica: replica.clone(),
                    reason: "injected fault".to_string(),
                });
            }
            Some(Fault::Delay(delay)) => tokio::time::sleep(delay).await,
            None => {}
        }

        let reply = encode_request(&request)
            .and_then(|frame| self.serve(replica, &frame))
            .and_then(|frame| decode_response(&frame))
            .map_err(|e| ReplicaError::Unreachable {
                replica: replica.clone(),
                reason: e.to_string(),
            })?;

        debug_assert!(reply.answers(&request));
        Ok(reply)
    }
}

#[async_trait]
impl ReplicaClient for LocalCluster {
    async fn get(&self, replica: &ReplicaId, request: GetRequest) -> ReplicaResult<GetResponse> {
        match self.exchange(replica, Request::Get(request)).await? {
            Response::Get(response) => Ok(response),
            other => Err(ReplicaError::Unreachable {
                replica: replica.clone(),
                reason: format!("mismatched response kind: {:#04x}", other.discriminant()),
            }),
        }
    }

    async fn put(&self, replica: &ReplicaId, request: PutRequest) -> ReplicaResult<PutResponse> {
        match self.exchange(replica, Request::Put(request)).await? {
            Response::Put(response) => Ok(response),
            other => Err(ReplicaError::Unreachable {
                replica: replica.clone(),
                reason: format!("mismatched response kind: {:#04x}", other.discriminant()),
            }),
        }
    }
}
