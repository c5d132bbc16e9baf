//! Fixed set of scrape targets, built once from `name:port` mappings.

use std::collections::HashMap;

use promux_core::error::{PromuxError, Result};

/// One co-located process: attribution label value, cache key and local port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub name: String,
    pub port: u16,
}

impl Target {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self { name: name.into(), port }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    by_name: HashMap<String, u16>,
    /// Excluded names that matched no mapping.
    unmatched: Vec<String>,
}

impl TargetSet {
    /// Parse `name:port` entries (repeated, or comma separated inside one
    /// entry) and drop every name listed in `excluded` (same list syntax).
    pub fn from_mappings<S: AsRef<str>>(entries: &[S], excluded: &[S]) -> Result<Self> {
        let mut by_name = HashMap::new();

        for raw in entries.iter().flat_map(|e| e.as_ref().split(',')) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let target = parse_mapping(raw)?;
            if by_name.insert(target.name.clone(), target.port).is_some() {
                return Err(PromuxError::Config(format!(
                    "duplicate container name {:?} in container:port list",
                    target.name
                )));
            }
        }

        if by_name.is_empty() {
            return Err(PromuxError::Config("received an empty container:port list".into()));
        }

        let excluded = excluded
            .iter()
            .flat_map(|e| e.as_ref().split(','))
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let mut unmatched = Vec::new();
        for name in excluded {
            if by_name.remove(name).is_none() {
                unmatched.push(name.to_string());
            }
        }

        if by_name.is_empty() {
            return Err(PromuxError::Config(
                "every mapped container is excluded, nothing to scrape".into(),
            ));
        }

        Ok(Self { by_name, unmatched })
    }

    pub fn get(&self, name: &str) -> Option<Target> {
        self.by_name.get(name).map(|port| Target::new(name, *port))
    }

    pub fn iter(&self) -> impl Iterator<Item = Target> + '_ {
        self.by_name.iter().map(|(name, port)| Target::new(name.as_str(), *port))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(String::as_str)
    }

    /// Excluded names with no mapping; logged once by `AppState::new`.
    pub fn unmatched_exclusions(&self) -> &[String] {
        &self.unmatched
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn parse_mapping(raw: &str) -> Result<Target> {
    let fields: Vec<&str> = raw.split(':').collect();
    let [name, port] = fields.as_slice() else {
        return Err(PromuxError::Config(format!(
            "container:port mapping {raw:?} must have exactly two fields"
        )));
    };
    if name.is_empty() {
        return Err(PromuxError::Config(format!("missing container name in {raw:?}")));
    }
    if port.is_empty() {
        return Err(PromuxError::Config(format!("missing port in {raw:?}")));
    }
    let port = port
        .parse::<u16>()
        .map_err(|e| PromuxError::Config(format!("invalid port in {raw:?}: {e}")))?;
    Ok(Target::new(*name, port))
}
