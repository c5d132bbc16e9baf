//! Aggregation endpoint: drain every target's snapshot and serve the lot.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use promux_core::gzip;

use crate::app_state::AppState;

const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

pub async fn serve_metrics(State(state): State<AppState>, method: Method, headers: HeaderMap) -> Response {
    if method != Method::GET {
        tracing::warn!(method = %method, "metrics endpoint only serves GET");
        return StatusCode::OK.into_response();
    }

    let cache = state.cache();
    let mut body = Vec::new();
    for name in state.targets().names() {
        match cache.consume(name) {
            Some(snapshot) => body.extend_from_slice(&snapshot),
            None => tracing::warn!(container = %name, "missing metric"),
        }
    }

    let mut out = HeaderMap::new();
    out.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_TEXT));

    if accepts_gzip(&headers) {
        match gzip::compress(&body) {
            Ok(packed) => {
                out.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                body = packed;
            }
            Err(e) => {
                tracing::warn!(kind = e.kind().as_str(), error = %e, "gzip failed, serving identity body");
            }
        }
    }

    (StatusCode::OK, out, Bytes::from(body)).into_response()
}

/// True when any `Accept-Encoding` token is `gzip` or `gzip;<params>`.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|token| token == "gzip" || token.starts_with("gzip;"))
}
