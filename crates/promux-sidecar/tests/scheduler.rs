#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use promux_core::error::{PromuxError, Result};
use promux_sidecar::cache::{SnapshotCache, SnapshotStore};
use promux_sidecar::config;
use promux_sidecar::scrape::{MetricSource, ScrapePipeline, ScrapeScheduler};
use promux_sidecar::server;
use promux_sidecar::targets::{Target, TargetSet};
use tokio_util::sync::CancellationToken;

/// Serves a fixed body per target, or fails when none is set.
#[derive(Default)]
struct FakeSource {
    bodies: Mutex<Vec<(String, Result<Bytes>)>>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn set(&self, name: &str, body: Result<&'static str>) {
        let mut bodies = self.bodies.lock().unwrap();
        bodies.retain(|(n, _)| n != name);
        bodies.push((name.to_string(), body.map(|b| Bytes::from_static(b.as_bytes()))));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricSource for FakeSource {
    async fn fetch(&self, target: &Target, _endpoint: &str) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bodies = self.bodies.lock().unwrap();
        match bodies.iter().find(|(n, _)| *n == target.name) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(e))) => Err(PromuxError::Transport(e.to_string())),
            None => Err(PromuxError::Status { status: 503 }),
        }
    }
}

fn pipeline(source: Arc<FakeSource>, cache: Arc<SnapshotCache>, label: &str) -> ScrapePipeline {
    ScrapePipeline::new(source, cache, "/metrics", label)
}

async fn wait_for(cache: &SnapshotCache, key: &str) -> Bytes {
    for _ in 0..200 {
        if let Some(b) = cache.peek(key) {
            return b;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no snapshot for {key}");
}

#[tokio::test]
async fn relabelled_snapshot_is_byte_exact() {
    let source = Arc::new(FakeSource::default());
    source.set("container1", Ok("new_metric 22222\n"));
    let cache = Arc::new(SnapshotCache::new());

    pipeline(source, cache.clone(), "multiplexer")
        .refresh(&Target::new("container1", 8080))
        .await;

    assert_eq!(
        cache.consume("container1").unwrap(),
        Bytes::from_static(b"# TYPE new_metric untyped\nnew_metric{multiplexer=\"container1\"} 22222\n")
    );
}

#[tokio::test]
async fn failed_cycles_leave_previous_snapshot() {
    let source = Arc::new(FakeSource::default());
    let cache = Arc::new(SnapshotCache::new());
    let p = pipeline(source.clone(), cache.clone(), "container");
    let target = Target::new("c1", 1);

    source.set("c1", Ok("up 1\n"));
    p.refresh(&target).await;
    let good = cache.peek("c1").unwrap();

    for broken in [
        Err(PromuxError::Transport("refused".into())),
        Ok("random words that are not metrics"),
        Ok(""),
        Ok("# only a comment\n"),
    ] {
        source.set("c1", broken);
        let err = p.scrape(&target).await;
        assert!(err.is_err());
        p.refresh(&target).await;
        assert_eq!(cache.peek("c1"), Some(good.clone()));
    }
}

#[tokio::test]
async fn scrape_errors_keep_their_kind() {
    let source = Arc::new(FakeSource::default());
    let p = pipeline(source.clone(), Arc::new(SnapshotCache::new()), "container");
    let target = Target::new("c1", 1);

    let err = p.scrape(&target).await.unwrap_err();
    assert_eq!(err.kind().as_str(), "STATUS");

    source.set("c1", Ok("up{a=\"1\",a=\"2\"} 1\n"));
    assert_eq!(p.scrape(&target).await.unwrap_err().kind().as_str(), "DECODE");

    source.set("c1", Ok("# HELP only never sampled\n"));
    assert_eq!(p.scrape(&target).await.unwrap_err().kind().as_str(), "INVALID_INPUT");
}

#[tokio::test]
async fn scheduler_fills_cache_and_stops_on_shutdown() {
    let source = Arc::new(FakeSource::default());
    source.set("c1", Ok("one 1\n"));
    source.set("c2", Ok("two 2\n"));
    let cache = Arc::new(SnapshotCache::new());
    let targets = TargetSet::from_mappings(&["c1:1,c2:2"], &[]).unwrap();

    let mut scheduler = ScrapeScheduler::new(
        pipeline(source.clone(), cache.clone(), "container"),
        Duration::from_millis(10),
    );
    scheduler.start(&targets);
    assert_eq!(scheduler.running(), 2);
    let mut names: Vec<&str> = scheduler.targets().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["c1", "c2"]);

    assert_eq!(&wait_for(&cache, "c1").await[..], b"# TYPE one untyped\none{container=\"c1\"} 1\n");
    assert_eq!(&wait_for(&cache, "c2").await[..], b"# TYPE two untyped\ntwo{container=\"c2\"} 2\n");

    let token = scheduler.cancellation_token();
    scheduler.shutdown().await;
    assert!(token.is_cancelled());

    let after = source.calls();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(), after);
}

#[tokio::test]
async fn failing_target_does_not_block_others() {
    let source = Arc::new(FakeSource::default());
    source.set("good", Ok("ok 1\n"));
    let cache = Arc::new(SnapshotCache::new());
    let targets = TargetSet::from_mappings(&["good:1", "bad:2"], &[]).unwrap();

    let mut scheduler = ScrapeScheduler::new(
        pipeline(source, cache.clone(), "container"),
        Duration::from_millis(10),
    );
    scheduler.start(&targets);

    wait_for(&cache, "good").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.peek("bad").is_none());
    assert_eq!(scheduler.running(), 2);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn stopping_one_target_keeps_the_rest() {
    let source = Arc::new(FakeSource::default());
    source.set("c1", Ok("one 1\n"));
    source.set("c2", Ok("two 2\n"));
    let cache = Arc::new(SnapshotCache::new());
    let targets = TargetSet::from_mappings(&["c1:1", "c2:2"], &[]).unwrap();

    let mut scheduler = ScrapeScheduler::new(
        pipeline(source, cache.clone(), "container"),
        Duration::from_millis(10),
    );
    scheduler.start(&targets);
    assert!(scheduler.stop("c1"));
    assert!(!scheduler.stop("nope"));

    wait_for(&cache, "c2").await;
    for _ in 0..100 {
        if scheduler.running() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(scheduler.running(), 1);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn sidecar_serves_live_targets_end_to_end() {
    let upstream = Router::new().route("/metrics", get(|| async { "new_metric 22222\n" }));
    let up_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let up_port = up_listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(up_listener, upstream).await.unwrap();
    });

    let cfg = config::load_from_str(&format!(
        "container_label: multiplexer\nscrape_interval_ms: 10\ncontainer_to_port_map: [\"container1:{up_port}\"]\n"
    ))
    .unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let served = tokio::spawn(server::serve(listener, cfg, shutdown.clone()));

    let client = reqwest::Client::new();
    let mut body = String::new();
    for _ in 0..200 {
        let resp = client.get(format!("http://{addr}/metrics")).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        body = resp.text().await.unwrap();
        if !body.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(body, "# TYPE new_metric untyped\nnew_metric{multiplexer=\"container1\"} 22222\n");

    drop(client);
    shutdown.cancel();
    served.await.unwrap().unwrap();
}
