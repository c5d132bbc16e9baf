//! Shared application state for the sidecar.
//!
//! Holds the validated config, the resolved target set, and the snapshot
//! cache the scrape loops write into.

use std::sync::Arc;

use promux_core::error::Result;

use crate::cache::SnapshotStore;
use crate::config::SidecarConfig;
use crate::targets::TargetSet;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    cache: Arc<dyn SnapshotStore>,
}

struct AppStateInner {
    cfg: SidecarConfig,
    targets: TargetSet,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can report a bad target list instead of panicking.
    /// Called once per process, so exclusion warnings are logged here.
    pub fn new(cfg: SidecarConfig, cache: Arc<dyn SnapshotStore>) -> Result<Self> {
        let targets = cfg.targets()?;
        for name in targets.unmatched_exclusions() {
            tracing::warn!(container = %name, "excluded container has no port mapping");
        }
        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, targets }),
            cache,
        })
    }

    pub fn cfg(&self) -> &SidecarConfig {
        &self.inner.cfg
    }

    pub fn targets(&self) -> &TargetSet {
        &self.inner.targets
    }

    pub fn cache(&self) -> Arc<dyn SnapshotStore> {
        Arc::clone(&self.cache)
    }
}
