use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Decoded families keyed by family name. Iteration order carries no meaning.
pub type MetricFamilies = HashMap<String, MetricFamily>;

/// Family type tag as written in `# TYPE` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricType {
    #[default]
    Untyped,
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Untyped => "untyped",
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "untyped" => Ok(MetricType::Untyped),
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "histogram" => Ok(MetricType::Histogram),
            "summary" => Ok(MetricType::Summary),
            other => Err(format!("unknown metric type {other:?}")),
        }
    }
}

/// One `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelPair {
    pub name: String,
    pub value: String,
}

impl LabelPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    pub sample_count: u64,
    pub sample_sum: f64,
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub sample_count: u64,
    pub sample_sum: f64,
    pub quantiles: Vec<Quantile>,
}

/// Type-specific payload of a metric. Must agree with the family's `MetricType`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Untyped(f64),
    Counter(f64),
    Gauge(f64),
    Histogram(Histogram),
    Summary(Summary),
}

impl MetricValue {
    /// Value carried by a single scalar sample of the given family type.
    pub(crate) fn scalar(ty: MetricType, v: f64) -> Option<Self> {
        match ty {
            MetricType::Untyped => Some(MetricValue::Untyped(v)),
            MetricType::Counter => Some(MetricValue::Counter(v)),
            MetricType::Gauge => Some(MetricValue::Gauge(v)),
            MetricType::Histogram | MetricType::Summary => None,
        }
    }
}

/// One labelled instance inside a family.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub labels: Vec<LabelPair>,
    pub timestamp_ms: Option<i64>,
    pub value: MetricValue,
}

impl Metric {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: Option<String>,
    pub metric_type: MetricType,
    pub metrics: Vec<Metric>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            help: None,
            metric_type,
            metrics: Vec::new(),
        }
    }
}
