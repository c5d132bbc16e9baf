//! promux: one scrape endpoint for every container in the pod.
//!
//! Depend on this crate to get the exposition codec and the sidecar runtime
//! together. The most common entry points are re-exported at the root.

pub mod core {
    pub use promux_core::*;
}

pub mod sidecar {
    pub use promux_sidecar::*;
}

pub use promux_core::{decode, encode, inject_label, MetricFamilies, MetricFamily, PromuxError, Result};
pub use promux_sidecar::cache::{SnapshotCache, SnapshotStore};
pub use promux_sidecar::config::SidecarConfig;
pub use promux_sidecar::server::{run, serve};
