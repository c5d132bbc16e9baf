//! One HTTP GET against a target's local metrics endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use promux_core::error::{PromuxError, Result};
use promux_core::gzip;

use crate::targets::Target;

/// Prefer OpenMetrics, fall back to the 0.0.4 text format.
pub const ACCEPT_HEADER: &str =
    "application/openmetrics-text; version=0.0.1,text/plain;version=0.0.4;q=0.5,*/*;q=0.1";

pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(20);

/// Fully buffered response, body exactly as received on the wire.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_encoding: Option<String>,
    pub body: Bytes,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(&'static str, &'static str)]) -> Result<HttpResponse>;
}

/// Production transport. Automatic decompression is off so the fetcher sees
/// the raw `Content-Encoding`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| PromuxError::Internal(format!("http client build failed: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(&'static str, &'static str)]) -> Result<HttpResponse> {
        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| PromuxError::Transport(format!("GET {url} failed: {e}")))?;

        let status = resp.status().as_u16();
        let content_encoding = resp
            .headers()
            .get(reqwest::header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp
            .bytes()
            .await
            .map_err(|e| PromuxError::Transport(format!("reading body of {url} failed: {e}")))?;

        Ok(HttpResponse { status, content_encoding, body })
    }
}

/// Anything that can produce raw exposition bytes for a target.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn fetch(&self, target: &Target, endpoint: &str) -> Result<Bytes>;
}

pub struct MetricFetcher {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl MetricFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn url_for(target: &Target, endpoint: &str) -> String {
        format!("http://localhost:{}{}", target.port, endpoint)
    }
}

#[async_trait]
impl MetricSource for MetricFetcher {
    async fn fetch(&self, target: &Target, endpoint: &str) -> Result<Bytes> {
        let url = Self::url_for(target, endpoint);
        let headers = [("Accept-Encoding", "gzip"), ("Accept", ACCEPT_HEADER)];

        let resp = tokio::time::timeout(self.timeout, self.transport.get(&url, &headers))
            .await
            .map_err(|_| {
                PromuxError::Transport(format!("GET {url} timed out after {:?}", self.timeout))
            })??;

        if resp.status != 200 {
            return Err(PromuxError::Status { status: resp.status });
        }

        let gzipped = resp
            .content_encoding
            .as_deref()
            .is_some_and(|enc| enc.trim().eq_ignore_ascii_case("gzip"));
        if gzipped {
            return gzip::decompress(&resp.body).map(Bytes::from);
        }
        Ok(resp.body)
    }
}
