//! promux sidecar binary.
//!
//! Scrapes every co-located container on its own interval and republishes the
//! relabelled metrics on one endpoint.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use promux_sidecar::{cli::Cli, server};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cfg = match Cli::parse().into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "invalid configuration");
            return ExitCode::from(2);
        }
    };

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        on_signal.cancel();
    });

    match server::run(cfg, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "promux-sidecar stopped");
            ExitCode::FAILURE
        }
    }
}
