use crate::error::{PromuxError, Result};

use super::model::{LabelPair, Metric, MetricFamilies, MetricFamily, MetricType, MetricValue};

/// Encode every family and concatenate the results.
pub fn encode(families: &MetricFamilies) -> Result<Vec<u8>> {
    if families.is_empty() {
        return Err(PromuxError::Encode("empty MetricFamily input".into()));
    }
    let mut out = String::new();
    for family in families.values() {
        encode_family(&mut out, family)?;
    }
    Ok(out.into_bytes())
}

/// Write one family: optional `# HELP`, `# TYPE`, then one line per sample.
pub fn encode_family(out: &mut String, family: &MetricFamily) -> Result<()> {
    let name = family.name.as_str();
    if name.is_empty() {
        return Err(PromuxError::Encode("metric family has no name".into()));
    }
    if family.metrics.is_empty() {
        return Err(PromuxError::Encode(format!(
            "metric family {name} has no metrics"
        )));
    }

    if let Some(help) = &family.help {
        out.push_str(&format!("# HELP {name} {}\n", escape_help(help)));
    }
    out.push_str(&format!("# TYPE {name} {}\n", family.metric_type));

    for metric in &family.metrics {
        write_metric(out, name, family.metric_type, metric)?;
    }
    Ok(())
}

fn write_metric(out: &mut String, name: &str, ty: MetricType, metric: &Metric) -> Result<()> {
    let labels = &metric.labels;
    let ts = metric.timestamp_ms;
    match (ty, &metric.value) {
        (MetricType::Untyped, MetricValue::Untyped(v))
        | (MetricType::Counter, MetricValue::Counter(v))
        | (MetricType::Gauge, MetricValue::Gauge(v)) => {
            write_sample(out, name, "", labels, None, *v, ts);
        }
        (MetricType::Summary, MetricValue::Summary(s)) => {
            for q in &s.quantiles {
                let q_label = format_float(q.quantile);
                write_sample(out, name, "", labels, Some(("quantile", q_label.as_str())), q.value, ts);
            }
            write_sample(out, name, "_sum", labels, None, s.sample_sum, ts);
            write_sample(out, name, "_count", labels, None, s.sample_count as f64, ts);
        }
        (MetricType::Histogram, MetricValue::Histogram(h)) => {
            let mut saw_inf = false;
            for b in &h.buckets {
                let le = format_float(b.upper_bound);
                write_sample(out, name, "_bucket", labels, Some(("le", le.as_str())), b.cumulative_count as f64, ts);
                saw_inf |= b.upper_bound == f64::INFINITY;
            }
            if !saw_inf {
                write_sample(out, name, "_bucket", labels, Some(("le", "+Inf")), h.sample_count as f64, ts);
            }
            write_sample(out, name, "_sum", labels, None, h.sample_sum, ts);
            write_sample(out, name, "_count", labels, None, h.sample_count as f64, ts);
        }
        (ty, _) => {
            return Err(PromuxError::Encode(format!(
                "metric value does not match {ty} family {name}"
            )))
        }
    }
    Ok(())
}

fn write_sample(
    out: &mut String,
    name: &str,
    suffix: &str,
    labels: &[LabelPair],
    extra: Option<(&str, &str)>,
    value: f64,
    timestamp_ms: Option<i64>,
) {
    out.push_str(name);
    out.push_str(suffix);

    if !labels.is_empty() || extra.is_some() {
        let rendered = labels
            .iter()
            .map(|l| (l.name.as_str(), l.value.as_str()))
            .chain(extra)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",");
        out.push('{');
        out.push_str(&rendered);
        out.push('}');
    }

    out.push(' ');
    out.push_str(&format_float(value));
    if let Some(ts) = timestamp_ms {
        out.push(' ');
        out.push_str(&ts.to_string());
    }
    out.push('\n');
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Shortest `%g`-style rendering: plain decimal for exponents in [-4, 6),
/// scientific with a signed two-digit exponent otherwise (`1e+06`, `1.5e-05`).
/// Zero keeps its sign (`0`, `-0`).
pub(crate) fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf".into() } else { "-Inf".into() };
    }
    let sci = format!("{v:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{v}");
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return format!("{v}");
    };
    if (-4..6).contains(&exp) {
        format!("{v}")
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}
