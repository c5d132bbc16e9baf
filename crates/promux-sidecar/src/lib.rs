//! promux sidecar library entry.
//!
//! Wires configuration, the target set, the snapshot cache, the per-target
//! scrape loops and the aggregation endpoint. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod cache;
pub mod cli;
pub mod config;
pub mod router;
pub mod scrape;
pub mod server;
pub mod targets;
pub mod transport;
