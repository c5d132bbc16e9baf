//! Consume-once snapshot cache shared by the scrape loops and the handler.

pub mod snapshot;

use bytes::Bytes;

pub use snapshot::SnapshotCache;

/// Keyed store of the latest relabelled payload per target.
///
/// `consume` is read-and-remove: for any one `store`, at most one caller
/// observes the payload.
pub trait SnapshotStore: Send + Sync {
    /// Overwrite the entry for `key`. Empty snapshots are ignored.
    fn store(&self, key: &str, snapshot: Bytes);

    fn consume(&self, key: &str) -> Option<Bytes>;
}
