//! Text exposition format (version 0.0.4).
//!
//! `decode` turns raw scrape bytes into [`MetricFamilies`]; `encode` writes them
//! back. Both are panic-free: malformed input is reported as
//! `PromuxError::Decode`/`PromuxError::Encode` with the offending line number.
//!
//! Encoding is semantically lossless but not byte-preserving: family order
//! follows map iteration, every family gets a `# TYPE` line, and numbers are
//! re-rendered in their shortest form.

mod decode;
mod encode;
pub mod model;

pub use decode::decode;
pub use encode::{encode, encode_family};
pub use model::{
    Bucket, Histogram, LabelPair, Metric, MetricFamilies, MetricFamily, MetricType, MetricValue,
    Quantile, Summary,
};

/// Label name rule of the exposition format: `[a-zA-Z_][a-zA-Z0-9_]*`.
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Metric name rule: `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
