use bytes::Bytes;
use dashmap::DashMap;

use super::SnapshotStore;

/// Sharded map, so stores and consumes for different targets never contend
/// on one lock.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: DashMap<String, Bytes>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Non-consuming read, for diagnostics and tests.
    pub fn peek(&self, key: &str) -> Option<Bytes> {
        self.entries.get(key).map(|e| e.value().clone())
    }
}

impl SnapshotStore for SnapshotCache {
    fn store(&self, key: &str, snapshot: Bytes) {
        if snapshot.is_empty() {
            return;
        }
        self.entries.insert(key.to_string(), snapshot);
    }

    fn consume(&self, key: &str) -> Option<Bytes> {
        self.entries.remove(key).map(|(_, snapshot)| snapshot)
    }
}
