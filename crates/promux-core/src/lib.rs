//! promux core: transport-agnostic exposition primitives and the shared error type.
//!
//! This crate holds the text exposition codec, the attribution label injector and
//! the gzip helpers shared by the sidecar. It carries no network or runtime
//! dependencies so the whole scrape transformation can be exercised in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed scrape payloads surface as `PromuxError::Decode` instead of
//! crashing the process that hosts the codec.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod exposition;
pub mod gzip;
pub mod relabel;

/// Shared result type.
pub use error::{ErrorKind, PromuxError, Result};
pub use exposition::{decode, encode, MetricFamilies, MetricFamily};
pub use relabel::inject_label;
