//! Scrape side of the pipeline: fetch, relabel, store.

pub mod fetcher;
pub mod scheduler;

pub use fetcher::{
    HttpResponse, HttpTransport, MetricFetcher, MetricSource, ReqwestTransport, ACCEPT_HEADER,
    DEFAULT_SCRAPE_TIMEOUT,
};
pub use scheduler::{ScrapePipeline, ScrapeScheduler};
