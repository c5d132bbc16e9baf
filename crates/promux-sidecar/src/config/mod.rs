//! Sidecar config loader (strict parsing).

pub mod schema;

use std::fs;

use promux_core::error::{PromuxError, Result};

pub use schema::SidecarConfig;

pub fn load_from_file(path: &str) -> Result<SidecarConfig> {
    let cfg = read_from_file(path)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<SidecarConfig> {
    let cfg = parse(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Parse without validating, so CLI flags can still be layered on top.
pub fn read_from_file(path: &str) -> Result<SidecarConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PromuxError::Config(format!("read config {path} failed: {e}")))?;
    parse(&s)
}

fn parse(s: &str) -> Result<SidecarConfig> {
    serde_yaml::from_str(s).map_err(|e| PromuxError::Config(format!("invalid yaml: {e}")))
}
