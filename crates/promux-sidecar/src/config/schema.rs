use std::time::Duration;

use promux_core::error::{PromuxError, Result};
use promux_core::exposition::is_valid_label_name;
use serde::Deserialize;

use crate::targets::TargetSet;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SidecarConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_export_port")]
    pub export_port: u16,

    #[serde(default = "default_container_label")]
    pub container_label: String,

    #[serde(default = "default_scrape_interval_ms")]
    pub scrape_interval_ms: u64,

    #[serde(default = "default_scrape_timeout_ms")]
    pub scrape_timeout_ms: u64,

    #[serde(default)]
    pub exclude_containers: Vec<String>,

    #[serde(default)]
    pub container_to_port_map: Vec<String>,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            export_port: default_export_port(),
            container_label: default_container_label(),
            scrape_interval_ms: default_scrape_interval_ms(),
            scrape_timeout_ms: default_scrape_timeout_ms(),
            exclude_containers: Vec::new(),
            container_to_port_map: Vec::new(),
        }
    }
}

impl SidecarConfig {
    pub fn validate(&self) -> Result<()> {
        if !is_valid_label_name(&self.container_label) {
            return Err(PromuxError::Config(format!(
                "container_label {:?} is not a valid label name",
                self.container_label
            )));
        }
        if !self.endpoint.starts_with('/') || self.endpoint.contains([':', '*']) {
            return Err(PromuxError::Config(format!(
                "endpoint {:?} must be an absolute path without ':' or '*'",
                self.endpoint
            )));
        }
        if self.scrape_interval_ms == 0 {
            return Err(PromuxError::Config("scrape_interval_ms must be greater than 0".into()));
        }
        if self.scrape_timeout_ms == 0 {
            return Err(PromuxError::Config("scrape_timeout_ms must be greater than 0".into()));
        }

        self.targets()?; // mapping syntax, duplicates, exclusions

        Ok(())
    }

    /// Target set left after applying `exclude_containers`.
    pub fn targets(&self) -> Result<TargetSet> {
        TargetSet::from_mappings(&self.container_to_port_map, &self.exclude_containers)
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_millis(self.scrape_interval_ms)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_millis(self.scrape_timeout_ms)
    }
}

fn default_endpoint() -> String {
    "/metrics".into()
}
fn default_export_port() -> u16 {
    13434
}
fn default_container_label() -> String {
    "container".into()
}
fn default_scrape_interval_ms() -> u64 {
    200
}
fn default_scrape_timeout_ms() -> u64 {
    20000
}
