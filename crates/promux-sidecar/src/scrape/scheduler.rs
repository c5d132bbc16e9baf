//! One polling task per target, each on its own interval.
//!
//! A tick runs fetch → decode → relabel → encode → store. Ticks of one target
//! never overlap: the loop awaits the cycle before taking the next tick, and
//! ticks missed meanwhile are skipped rather than bursted.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::join_all;
use promux_core::error::Result;
use promux_core::exposition::{decode, encode};
use promux_core::relabel::inject_label;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cache::SnapshotStore;
use crate::scrape::fetcher::MetricSource;
use crate::targets::{Target, TargetSet};

/// Everything one scrape cycle needs, shared by all target loops.
#[derive(Clone)]
pub struct ScrapePipeline {
    source: Arc<dyn MetricSource>,
    cache: Arc<dyn SnapshotStore>,
    endpoint: Arc<str>,
    label_name: Arc<str>,
}

impl ScrapePipeline {
    pub fn new(
        source: Arc<dyn MetricSource>,
        cache: Arc<dyn SnapshotStore>,
        endpoint: &str,
        label_name: &str,
    ) -> Self {
        Self {
            source,
            cache,
            endpoint: Arc::from(endpoint),
            label_name: Arc::from(label_name),
        }
    }

    /// Fetch and relabel one target without touching the cache.
    pub async fn scrape(&self, target: &Target) -> Result<Bytes> {
        let raw = self.source.fetch(target, &self.endpoint).await?;
        let mut families = decode(&raw)?;
        inject_label(&self.label_name, &target.name, &mut families)?;
        Ok(Bytes::from(encode(&families)?))
    }

    /// One tick: store on success, log and keep the previous entry on failure.
    pub async fn refresh(&self, target: &Target) {
        match self.scrape(target).await {
            Ok(snapshot) => {
                tracing::trace!(container = %target.name, bytes = snapshot.len(), "snapshot stored");
                self.cache.store(&target.name, snapshot);
            }
            Err(e) => {
                tracing::warn!(
                    container = %target.name,
                    port = target.port,
                    endpoint = %self.endpoint,
                    kind = e.kind().as_str(),
                    error = %e,
                    "scrape cycle failed"
                );
            }
        }
    }
}

struct ScrapeTask {
    target: Target,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ScrapeScheduler {
    pipeline: ScrapePipeline,
    interval: Duration,
    root: CancellationToken,
    tasks: Vec<ScrapeTask>,
}

impl ScrapeScheduler {
    pub fn new(pipeline: ScrapePipeline, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            root: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Spawn one loop per target. Must be called inside a tokio runtime.
    pub fn start(&mut self, targets: &TargetSet) {
        for target in targets.iter() {
            let token = self.root.child_token();
            let handle = tokio::spawn(run_target(
                self.pipeline.clone(),
                target.clone(),
                self.interval,
                token.clone(),
            ));
            tracing::info!(container = %target.name, port = target.port, "scrape loop started");
            self.tasks.push(ScrapeTask { target, token, handle });
        }
    }

    /// Root token; cancelling it stops every loop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.root.clone()
    }

    pub fn running(&self) -> usize {
        self.tasks.iter().filter(|t| !t.handle.is_finished()).count()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> + '_ {
        self.tasks.iter().map(|t| &t.target)
    }

    /// Stop a single target's loop. Returns false for unknown names.
    pub fn stop(&self, name: &str) -> bool {
        match self.tasks.iter().find(|t| t.target.name == name) {
            Some(task) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every loop and wait for all of them to exit.
    pub async fn shutdown(self) {
        self.root.cancel();
        let names: Vec<String> = self.tasks.iter().map(|t| t.target.name.clone()).collect();
        let results = join_all(self.tasks.into_iter().map(|t| t.handle)).await;
        for (name, res) in names.iter().zip(results) {
            if let Err(e) = res {
                tracing::warn!(container = %name, error = %e, "scrape loop ended abnormally");
            }
        }
        tracing::info!(loops = names.len(), "scrape scheduler stopped");
    }
}

async fn run_target(pipeline: ScrapePipeline, target: Target, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = pipeline.refresh(&target) => {}
        }
    }
    tracing::debug!(container = %target.name, "scrape loop stopped");
}
