//! Command-line flags, layered over an optional YAML file.

use clap::Parser;
use promux_core::error::Result;

use crate::config::{self, SidecarConfig};

#[derive(Debug, Parser)]
#[command(name = "promux-sidecar", version, about = "Multiplex co-located Prometheus endpoints into one")]
pub struct Cli {
    /// YAML config file; flags override its values.
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Metrics path on the targets and on the export port.
    #[arg(short = 'p', long = "endpoint")]
    pub endpoint: Option<String>,

    /// Port the aggregated endpoint listens on.
    #[arg(short = 'e', long = "export_to")]
    pub export_to: Option<u16>,

    /// Label name carrying the origin container.
    #[arg(short = 'n', long = "container_label")]
    pub container_label: Option<String>,

    /// Scrape interval in milliseconds.
    #[arg(short = 'i', long = "scrape_interval")]
    pub scrape_interval: Option<u64>,

    /// Per-scrape timeout in milliseconds.
    #[arg(short = 't', long = "scrape_timeout")]
    pub scrape_timeout: Option<u64>,

    /// Containers to skip. Repeatable or comma separated.
    #[arg(short = 'x', long = "exclude_containers")]
    pub exclude_containers: Vec<String>,

    /// `name:port` pairs. Repeatable or comma separated.
    #[arg(short = 'm', long = "container_to_port_map")]
    pub container_to_port_map: Vec<String>,
}

impl Cli {
    /// Resolve the final config: file (or defaults), then flags, then validate.
    pub fn into_config(self) -> Result<SidecarConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::read_from_file(path)?,
            None => SidecarConfig::default(),
        };

        if let Some(v) = self.endpoint {
            cfg.endpoint = v;
        }
        if let Some(v) = self.export_to {
            cfg.export_port = v;
        }
        if let Some(v) = self.container_label {
            cfg.container_label = v;
        }
        if let Some(v) = self.scrape_interval {
            cfg.scrape_interval_ms = v;
        }
        if let Some(v) = self.scrape_timeout {
            cfg.scrape_timeout_ms = v;
        }
        if !self.exclude_containers.is_empty() {
            cfg.exclude_containers = self.exclude_containers;
        }
        if !self.container_to_port_map.is_empty() {
            cfg.container_to_port_map = self.container_to_port_map;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
