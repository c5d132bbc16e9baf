//! Line-oriented parser for the text exposition format.
//!
//! Parsing rules:
//! - Blank lines, leading whitespace and plain `#` comments are skipped.
//! - `# HELP` / `# TYPE` may appear at most once per family; `# TYPE` must
//!   precede the family's samples. Help text only allows `\\` and `\n` escapes.
//! - `_bucket`, `_sum` and `_count` samples attach to an already typed
//!   histogram (or summary, for `_sum`/`_count`) family; everything else is a
//!   family of its own, untyped unless declared otherwise.

use std::collections::HashMap;

use crate::error::{PromuxError, Result};

use super::model::{
    Bucket, Histogram, LabelPair, Metric, MetricFamilies, MetricFamily, MetricType, MetricValue,
    Quantile, Summary,
};
use super::{is_valid_label_name, is_valid_metric_name};

type LineResult<T> = std::result::Result<T, String>;

/// Decode raw exposition text into metric families.
pub fn decode(raw: &[u8]) -> Result<MetricFamilies> {
    if raw.is_empty() {
        return Err(PromuxError::Decode("empty raw metrics input".into()));
    }
    let text = std::str::from_utf8(raw)
        .map_err(|e| PromuxError::Decode(format!("input is not valid utf-8: {e}")))?;

    let mut parser = Parser::default();
    for (idx, line) in text.lines().enumerate() {
        parser
            .line(line)
            .map_err(|msg| PromuxError::Decode(format!("line {}: {msg}", idx + 1)))?;
    }
    Ok(parser.finish())
}

/// Where a sample line lands inside its family.
#[derive(Debug, Clone, Copy)]
enum Role {
    Scalar,
    Quantile,
    Bucket,
    Sum,
    Count,
}

const SUFFIXES: [(&str, Role); 3] = [
    ("_bucket", Role::Bucket),
    ("_sum", Role::Sum),
    ("_count", Role::Count),
];

struct FamilyState {
    family: MetricFamily,
    typed: bool,
    /// Sorted label set (without `le`/`quantile`) -> index into `family.metrics`.
    groups: HashMap<Vec<(String, String)>, usize>,
}

impl FamilyState {
    fn new(name: &str) -> Self {
        Self {
            family: MetricFamily::new(name, MetricType::Untyped),
            typed: false,
            groups: HashMap::new(),
        }
    }

    /// Histogram/summary samples sharing a label set build up one metric.
    fn grouped(&mut self, labels: Vec<LabelPair>, timestamp_ms: Option<i64>) -> LineResult<&mut Metric> {
        let mut key: Vec<(String, String)> = labels
            .iter()
            .map(|l| (l.name.clone(), l.value.clone()))
            .collect();
        key.sort();

        let idx = match self.groups.get(&key) {
            Some(&idx) => idx,
            None => {
                let value = match self.family.metric_type {
                    MetricType::Histogram => MetricValue::Histogram(Histogram::default()),
                    MetricType::Summary => MetricValue::Summary(Summary::default()),
                    other => {
                        return Err(format!(
                            "family {:?} of type {other} cannot group samples",
                            self.family.name
                        ))
                    }
                };
                self.family.metrics.push(Metric {
                    labels,
                    timestamp_ms: None,
                    value,
                });
                let idx = self.family.metrics.len() - 1;
                self.groups.insert(key, idx);
                idx
            }
        };

        let metric = self
            .family
            .metrics
            .get_mut(idx)
            .ok_or_else(|| "metric group index out of range".to_string())?;
        if timestamp_ms.is_some() {
            metric.timestamp_ms = timestamp_ms;
        }
        Ok(metric)
    }
}

#[derive(Default)]
struct Parser {
    families: HashMap<String, FamilyState>,
}

impl Parser {
    fn line(&mut self, line: &str) -> LineResult<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        match line.strip_prefix('#') {
            Some(comment) => self.directive(comment),
            None => self.sample(line),
        }
    }

    fn state(&mut self, name: &str) -> &mut FamilyState {
        self.families
            .entry(name.to_string())
            .or_insert_with(|| FamilyState::new(name))
    }

    fn directive(&mut self, comment: &str) -> LineResult<()> {
        let (keyword, rest) = split_token(comment.trim_start());
        match keyword {
            "HELP" => {
                let (name, text) = split_token(rest);
                check_metric_name(name)?;
                let state = self.state(name);
                if state.family.help.is_some() {
                    return Err(format!("second HELP line for metric name {name:?}"));
                }
                state.family.help = Some(unescape_help(text)?);
                Ok(())
            }
            "TYPE" => {
                let (name, ty) = split_token(rest);
                check_metric_name(name)?;
                let ty: MetricType = ty.trim().parse()?;
                let state = self.state(name);
                if state.typed {
                    return Err(format!("second TYPE line for metric name {name:?}"));
                }
                if !state.family.metrics.is_empty() {
                    return Err(format!(
                        "TYPE line for metric name {name:?} must come before its samples"
                    ));
                }
                state.family.metric_type = ty;
                state.typed = true;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn sample(&mut self, line: &str) -> LineResult<()> {
        let name_end = line
            .find(|c: char| c == '{' || c.is_ascii_whitespace())
            .unwrap_or(line.len());
        let (name, rest) = line.split_at(name_end);
        check_metric_name(name)?;

        let mut rest = rest.trim_start();
        let mut labels = Vec::new();
        if let Some(inner) = rest.strip_prefix('{') {
            let (parsed, after) = parse_labels(inner)?;
            labels = parsed;
            rest = after;
        }

        let mut fields = rest.split_ascii_whitespace();
        let value = fields
            .next()
            .ok_or_else(|| format!("missing value for metric {name:?}"))?;
        let value = parse_float(value)?;
        let timestamp_ms = match fields.next() {
            Some(ts) => Some(
                ts.parse::<i64>()
                    .map_err(|e| format!("invalid timestamp {ts:?}: {e}"))?,
            ),
            None => None,
        };
        if let Some(extra) = fields.next() {
            return Err(format!("unexpected trailing content {extra:?}"));
        }

        self.place(name, labels, value, timestamp_ms)
    }

    fn resolve(&self, name: &str) -> (String, Role) {
        for (suffix, role) in SUFFIXES {
            let Some(base) = name.strip_suffix(suffix) else { continue };
            let parent = self.families.get(base).map(|s| s.family.metric_type);
            let attaches = matches!(
                (parent, role),
                (Some(MetricType::Histogram), _)
                    | (Some(MetricType::Summary), Role::Sum | Role::Count)
            );
            if attaches {
                return (base.to_string(), role);
            }
        }
        match self.families.get(name).map(|s| s.family.metric_type) {
            Some(MetricType::Summary) => (name.to_string(), Role::Quantile),
            _ => (name.to_string(), Role::Scalar),
        }
    }

    fn place(
        &mut self,
        name: &str,
        mut labels: Vec<LabelPair>,
        value: f64,
        timestamp_ms: Option<i64>,
    ) -> LineResult<()> {
        let (family_name, role) = self.resolve(name);
        let state = self.state(&family_name);

        match role {
            Role::Scalar => {
                let ty = state.family.metric_type;
                let value = MetricValue::scalar(ty, value).ok_or_else(|| {
                    format!("sample {name:?} does not belong to {ty} family {family_name:?}")
                })?;
                state.family.metrics.push(Metric {
                    labels,
                    timestamp_ms,
                    value,
                });
            }
            Role::Quantile => {
                let q = take_label(&mut labels, "quantile").ok_or_else(|| {
                    format!("summary sample {name:?} is missing the quantile label")
                })?;
                let quantile = parse_float(&q)?;
                let metric = state.grouped(labels, timestamp_ms)?;
                let MetricValue::Summary(summary) = &mut metric.value else {
                    return Err(format!("family {family_name:?} is not a summary"));
                };
                summary.quantiles.push(Quantile { quantile, value });
            }
            Role::Bucket => {
                let le = take_label(&mut labels, "le").ok_or_else(|| {
                    format!("histogram bucket {name:?} is missing the le label")
                })?;
                let upper_bound = parse_float(&le)?;
                let cumulative_count = parse_count(value)?;
                let metric = state.grouped(labels, timestamp_ms)?;
                let MetricValue::Histogram(histogram) = &mut metric.value else {
                    return Err(format!("family {family_name:?} is not a histogram"));
                };
                histogram.buckets.push(Bucket {
                    upper_bound,
                    cumulative_count,
                });
            }
            Role::Sum => match &mut state.grouped(labels, timestamp_ms)?.value {
                MetricValue::Histogram(h) => h.sample_sum = value,
                MetricValue::Summary(s) => s.sample_sum = value,
                _ => return Err(format!("unexpected sum sample {name:?}")),
            },
            Role::Count => {
                let count = parse_count(value)?;
                match &mut state.grouped(labels, timestamp_ms)?.value {
                    MetricValue::Histogram(h) => h.sample_count = count,
                    MetricValue::Summary(s) => s.sample_count = count,
                    _ => return Err(format!("unexpected count sample {name:?}")),
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> MetricFamilies {
        self.families
            .into_iter()
            .filter(|(_, state)| !state.family.metrics.is_empty())
            .map(|(name, state)| (name, state.family))
            .collect()
    }
}

fn split_token(s: &str) -> (&str, &str) {
    match s.find(|c: char| c.is_ascii_whitespace()) {
        Some(idx) => {
            let (token, rest) = s.split_at(idx);
            (token, rest.trim_start())
        }
        None => (s, ""),
    }
}

fn check_metric_name(name: &str) -> LineResult<()> {
    if name.is_empty() {
        return Err("missing metric name".into());
    }
    if !is_valid_metric_name(name) {
        return Err(format!("invalid metric name {name:?}"));
    }
    Ok(())
}

fn parse_float(s: &str) -> LineResult<f64> {
    s.parse::<f64>()
        .map_err(|_| format!("invalid float value {s:?}"))
}

fn parse_count(v: f64) -> LineResult<u64> {
    if v.is_nan() || v < 0.0 {
        return Err(format!("invalid count value {v}"));
    }
    Ok(v as u64)
}

fn take_label(labels: &mut Vec<LabelPair>, name: &str) -> Option<String> {
    let pos = labels.iter().position(|l| l.name == name)?;
    Some(labels.remove(pos).value)
}

fn parse_labels(mut rest: &str) -> LineResult<(Vec<LabelPair>, &str)> {
    let mut labels: Vec<LabelPair> = Vec::new();
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }

        let (name, after_name) = rest
            .split_once('=')
            .ok_or_else(|| "unterminated label set".to_string())?;
        let name = name.trim();
        if !is_valid_label_name(name) {
            return Err(format!("invalid label name {name:?}"));
        }
        if labels.iter().any(|l| l.name == name) {
            return Err(format!("duplicate label name {name:?}"));
        }

        let quoted = after_name
            .trim_start()
            .strip_prefix('"')
            .ok_or_else(|| format!("expected '\"' to open the value of label {name:?}"))?;
        let (value, after_value) = read_label_value(quoted)?;
        labels.push(LabelPair::new(name, value));

        rest = after_value.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }
        return Err(format!("expected ',' or '}}' after the value of label {name:?}"));
    }
}

/// Reads up to the closing quote, returning the unescaped value and the remainder.
fn read_label_value(s: &str) -> LineResult<(String, &str)> {
    let mut out = String::new();
    let mut chars = s.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((out, s.get(idx + 1..).unwrap_or(""))),
            '\\' => match chars.next() {
                Some((_, '\\')) => out.push('\\'),
                Some((_, '"')) => out.push('"'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, other)) => return Err(format!("invalid escape sequence '\\{other}'")),
                None => break,
            },
            c => out.push(c),
        }
    }
    Err("unterminated label value".into())
}

fn unescape_help(s: &str) -> LineResult<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some(other) => return Err(format!("invalid escape sequence '\\{other}' in help text")),
            None => return Err("invalid escape sequence at end of help text".into()),
        }
    }
    Ok(out)
}
