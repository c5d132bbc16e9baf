//! Startup and shutdown wiring for the whole sidecar.

use std::net::SocketAddr;
use std::sync::Arc;

use promux_core::error::{PromuxError, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::app_state::AppState;
use crate::cache::SnapshotCache;
use crate::config::SidecarConfig;
use crate::router;
use crate::scrape::{MetricFetcher, ReqwestTransport, ScrapePipeline, ScrapeScheduler};

/// Bind `0.0.0.0:<export_port>` and serve until `shutdown` fires.
pub async fn run(cfg: SidecarConfig, shutdown: CancellationToken) -> Result<()> {
    let listen = SocketAddr::from(([0, 0, 0, 0], cfg.export_port));
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| PromuxError::Internal(format!("bind {listen} failed: {e}")))?;
    serve(listener, cfg, shutdown).await
}

/// Serve on an already bound listener. Scrape loops run until `shutdown`
/// fires and are joined before returning.
pub async fn serve(listener: TcpListener, cfg: SidecarConfig, shutdown: CancellationToken) -> Result<()> {
    let cache = Arc::new(SnapshotCache::new());
    let state = AppState::new(cfg.clone(), cache.clone())?;

    let transport = Arc::new(ReqwestTransport::new()?);
    let fetcher = Arc::new(MetricFetcher::new(transport, cfg.scrape_timeout()));
    let pipeline = ScrapePipeline::new(fetcher, cache, &cfg.endpoint, &cfg.container_label);

    let mut scheduler = ScrapeScheduler::new(pipeline, cfg.scrape_interval());
    scheduler.start(state.targets());

    let app = router::build_router(state);
    let local = listener.local_addr().ok();
    tracing::info!(
        listen = ?local,
        endpoint = %cfg.endpoint,
        targets = scheduler.running(),
        "promux-sidecar serving"
    );

    let stop = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await
        .map_err(|e| PromuxError::Internal(format!("server failed: {e}")));

    scheduler.shutdown().await;
    served
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
