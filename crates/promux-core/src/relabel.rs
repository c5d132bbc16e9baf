//! Attribution label injection.

use crate::error::{PromuxError, Result};
use crate::exposition::{LabelPair, MetricFamilies};

/// Append `label_name="label_value"` to every metric of every family, in place.
///
/// Existing labels are left untouched, including one that already uses
/// `label_name`; rejecting such clashes is up to whoever picks the label name.
pub fn inject_label(label_name: &str, label_value: &str, families: &mut MetricFamilies) -> Result<()> {
    if label_name.is_empty() {
        return Err(PromuxError::InvalidInput("empty container label name input".into()));
    }
    if label_value.is_empty() {
        return Err(PromuxError::InvalidInput("empty container name input".into()));
    }
    if families.is_empty() {
        return Err(PromuxError::InvalidInput("empty MetricFamily map input".into()));
    }

    for family in families.values_mut() {
        for metric in &mut family.metrics {
            metric.labels.push(LabelPair::new(label_name, label_value));
        }
    }
    Ok(())
}
