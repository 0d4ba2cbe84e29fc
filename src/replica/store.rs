//! Versioned key-value storage on a single replica

use crate::protocol::Versioned;
use std::collections::HashMap;
use std::sync::Mutex;

/// Trait for replica-local storage backends.
///
/// `apply` is last-writer-wins under [`Versioned::cmp_priority`], so
/// repair writes and replayed writes are idempotent and commutative.
pub trait ReplicaStore: Send + Sync {
    /// Current record for the key; [`Versioned::missing`] when never stored.
    fn get(&self, key: &[u8]) -> Versioned;

    /// Apply an incoming record. Returns true when it replaced the current
    /// record, false when the replica already held something at least as new.
    fn apply(&self, key: &[u8], incoming: Versioned) -> bool;
}

/// In-memory store (default)
pub struct MemStore {
    map: Mutex<HashMap<Vec<u8>, Versioned>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().unwrap().is_empty()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicaStore for MemStore {
    fn get(&self, key: &[u8]) -> Versioned {
        self.map
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(Versioned::missing)
    }

    fn apply(&self, key: &[u8], incoming: Versioned) -> bool {
        let mut map = self.map.lock().unwrap();
        let current = map.get(key);
        let newer = match current {
            Some(existing) => incoming.cmp_priority(existing) == std::cmp::Ordering::Greater,
            None => true,
        };
        if newer {
            map.insert(key.to_vec(), incoming);
        }
        newer
    }
}
