//! Axum router wiring.
//!
//! Exposes the aggregation handler on the configured endpoint. Every method
//! is routed to it so non-GET requests get the logged empty 200.

use axum::{routing::any, Router};

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    let endpoint = state.cfg().endpoint.clone();
    Router::new()
        .route(&endpoint, any(transport::aggregate::serve_metrics))
        .with_state(state)
}
