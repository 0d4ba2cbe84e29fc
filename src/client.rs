//! Key-bound client handle
//!
//! An [`Entry`] wraps one key with a fixed replication spec and remembers
//! the last value and version it observed, so callers can read, overwrite,
//! conditionally overwrite, and delete a key without re-threading
//! parameters through every call.

use crate::coordinator::{Coordinator, ReplicaClient};
use crate::protocol::ReplicationSpec;
use crate::{Error, Result};
use bytes::Bytes;
use std::sync::Arc;

/// A handle to a single key on a coordinator.
pub struct Entry<C: ReplicaClient> {
    coordinator: Arc<Coordinator<C>>,
    key: Bytes,
    spec: ReplicationSpec,
    version: u64,
    value: Option<Bytes>,
}

impl<C: ReplicaClient> Entry<C> {
    /// Bind a key with the coordinator's default replication spec.
    pub fn new(coordinator: Arc<Coordinator<C>>, key: impl Into<Bytes>) -> Self {
        let spec = coordinator.config().replication;
        Self::with_spec(coordinator, key, spec)
    }

    /// Bind a key with an explicit (already validated) replication spec.
    pub fn with_spec(
        coordinator: Arc<Coordinator<C>>,
        key: impl Into<Bytes>,
        spec: ReplicationSpec,
    ) -> Self {
        Self {
            coordinator,
            key: key.into(),
            spec,
            version: 0,
            value: None,
        }
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// Last observed value; `None` until the first fetch, or when the key
    /// does not exist.
    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// Last observed (or assigned) version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Read the current value from the cluster, remembering value and
    /// version.
    pub async fn fetch(&mut self) -> Result<Option<Bytes>> {
        match self.coordinator.get_with(&self.key, self.spec).await? {
            Some(hit) => {
                self.version = hit.version;
                self.value = Some(hit.value.clone());
                Ok(Some(hit.value))
            }
            None => {
                self.value = None;
                Ok(None)
            }
        }
    }

    /// Write a new value, remembering it and the assigned version.
    pub async fn set(&mut self, value: impl Into<Bytes>) -> Result<u64> {
        let value = value.into();
        let version = self
            .coordinator
            .put_with(&self.key, value.clone(), self.spec)
            .await?;
        self.version = version;
        self.value = Some(value);
        Ok(version)
    }

    /// Conditional write: succeeds only while the cluster's current version
    /// for the key matches the last one this handle observed, and fails
    /// with [`Error::CasConflict`] otherwise. A key that does not exist
    /// (never written, or deleted) compares as version 0.
    ///
    /// The check is a quorum read followed by a quorum write, not an atomic
    /// replica-side operation; a writer landing between the two steps wins.
    pub async fn cas(&mut self, value: impl Into<Bytes>) -> Result<u64> {
        let expected = self.version;
        let actual = match self.coordinator.get_with(&self.key, self.spec).await? {
            Some(hit) => hit.version,
            None => 0,
        };
        if actual != expected {
            return Err(Error::CasConflict { expected, actual });
        }
        self.set(value).await
    }

    /// Delete the key (tombstone write).
    pub async fn delete(&mut self) -> Result<u64> {
        let version = self
            .coordinator
            .delete_with(&self.key, self.spec)
            .await?;
        self.version = version;
        self.value = None;
        Ok(version)
    }
}
