//! HTTP surface (axum handlers).

pub mod aggregate;
