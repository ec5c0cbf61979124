//! Tests for verifying that each pipeline outcome records its metrics with
//! the right labels.

#![cfg(feature = "metrics")]

use std::future::Future;

use async_trait::async_trait;
use http::{Request, StatusCode};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::{CompositeKey, MetricKind};
use prerender::{
    CachedSnapshot, Config, Outcome, Prerender, RenderStatus, Retrieval, Retriever,
    SnapshotCache, SnapshotRequest, UpstreamRequest, WriteOutcome,
};

const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

/// Type alias for snapshot entries
type SnapshotEntry = (
    CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
);

struct StaticRetriever(Retrieval);

#[async_trait]
impl Retriever for StaticRetriever {
    async fn fetch(&self, _request: UpstreamRequest) -> Retrieval {
        self.0.clone()
    }
}

struct AlwaysHit;

#[async_trait]
impl SnapshotCache for AlwaysHit {
    async fn read(&self, _request: &SnapshotRequest) -> CachedSnapshot {
        CachedSnapshot::hit("<html>cached</html>")
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct CancelAll;

#[async_trait]
impl SnapshotCache for CancelAll {
    async fn write(
        &self,
        _request: &SnapshotRequest,
        _error: Option<&str>,
        _body: Option<&str>,
    ) -> WriteOutcome {
        WriteOutcome::cancel()
    }

    fn name(&self) -> &str {
        "cancel"
    }
}

fn config() -> Config {
    Config::builder()
        .service_url("http://render.local")
        .build()
        .unwrap()
}

fn request(user_agent: Option<&str>) -> SnapshotRequest {
    let mut builder = Request::get("/pricing").header("host", "www.example.com");
    if let Some(user_agent) = user_agent {
        builder = builder.header("user-agent", user_agent);
    }
    SnapshotRequest::from_request(&builder.body(()).unwrap())
}

/// Runs `scenario` on a current-thread runtime with a local recorder
/// installed and returns everything it recorded.
fn record<F, Fut>(scenario: F) -> Vec<SnapshotEntry>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(scenario());
    });

    snapshotter.snapshot().into_vec()
}

/// Find a counter in entries by name and, optionally, one of its labels.
fn find_counter(entries: &[SnapshotEntry], name: &str, label: Option<(&str, &str)>) -> Option<u64> {
    for (key, _, _, value) in entries {
        if key.kind() != MetricKind::Counter || key.key().name() != name {
            continue;
        }
        let labelled = match label {
            Some((label_key, label_value)) => key
                .key()
                .labels()
                .any(|l| l.key() == label_key && l.value() == label_value),
            None => true,
        };
        if labelled && let DebugValue::Counter(v) = *value {
            return Some(v);
        }
    }
    None
}

/// Find a histogram in entries by name, return sample count.
fn histogram_count(entries: &[SnapshotEntry], name: &str) -> usize {
    for (key, _, _, value) in entries {
        if key.kind() == MetricKind::Histogram
            && key.key().name() == name
            && let DebugValue::Histogram(v) = value
        {
            return v.len();
        }
    }
    0
}

#[test]
fn test_hit_metrics() {
    let entries = record(|| async {
        let prerender = Prerender::builder()
            .config(config())
            .cache(AlwaysHit)
            .retriever(StaticRetriever(Retrieval::failure("unused")))
            .build();
        let outcome = prerender.render(&request(Some(GOOGLEBOT))).await.unwrap();
        assert_eq!(outcome.status(), RenderStatus::Hit);
    });

    assert_eq!(
        find_counter(&entries, "prerender_cache_hit_total", Some(("cache", "memory"))),
        Some(1)
    );
    assert_eq!(find_counter(&entries, "prerender_cache_miss_total", None), None);
    assert_eq!(histogram_count(&entries, "prerender_upstream_duration_seconds"), 0);
}

#[test]
fn test_miss_metrics() {
    let entries = record(|| async {
        let prerender = Prerender::builder()
            .config(config())
            .retriever(StaticRetriever(Retrieval::success(StatusCode::OK, "<html>")))
            .build();
        let outcome = prerender.render(&request(Some(GOOGLEBOT))).await.unwrap();
        assert!(matches!(outcome, Outcome::Snapshot(_)));
    });

    assert_eq!(
        find_counter(&entries, "prerender_cache_miss_total", Some(("cache", "none"))),
        Some(1)
    );
    assert_eq!(find_counter(&entries, "prerender_cache_hit_total", None), None);
    assert_eq!(
        histogram_count(&entries, "prerender_upstream_duration_seconds"),
        1,
        "upstream_duration should have 1 sample"
    );
    assert_eq!(find_counter(&entries, "prerender_render_error_total", None), None);
}

#[test]
fn test_bypass_metrics_carry_reason() {
    let entries = record(|| async {
        let prerender = Prerender::builder()
            .config(config())
            .retriever(StaticRetriever(Retrieval::failure("unused")))
            .build();
        for req in [request(Some(FIREFOX)), request(Some(FIREFOX)), request(None)] {
            assert_eq!(
                prerender.render(&req).await.unwrap(),
                Outcome::Continue(RenderStatus::Bypass)
            );
        }
    });

    assert_eq!(
        find_counter(&entries, "prerender_bypass_total", Some(("reason", "not_crawler"))),
        Some(2)
    );
    assert_eq!(
        find_counter(
            &entries,
            "prerender_bypass_total",
            Some(("reason", "missing_user_agent"))
        ),
        Some(1)
    );
    assert_eq!(find_counter(&entries, "prerender_cache_miss_total", None), None);
}

#[test]
fn test_cancelled_metrics() {
    let entries = record(|| async {
        let prerender = Prerender::builder()
            .config(config())
            .cache(CancelAll)
            .retriever(StaticRetriever(Retrieval::failure("connection refused")))
            .build();
        assert_eq!(
            prerender.render(&request(Some(GOOGLEBOT))).await.unwrap(),
            Outcome::Continue(RenderStatus::Cancelled)
        );
    });

    assert_eq!(
        find_counter(&entries, "prerender_render_cancelled_total", None),
        Some(1)
    );
    assert_eq!(find_counter(&entries, "prerender_render_error_total", None), None);
}

#[test]
fn test_error_metrics() {
    let entries = record(|| async {
        let prerender = Prerender::builder()
            .config(config())
            .retriever(StaticRetriever(Retrieval::failure("connection refused")))
            .build();
        assert!(prerender.render(&request(Some(GOOGLEBOT))).await.is_err());
    });

    assert_eq!(
        find_counter(&entries, "prerender_render_error_total", None),
        Some(1)
    );
    assert_eq!(
        find_counter(&entries, "prerender_cache_miss_total", Some(("cache", "none"))),
        Some(1)
    );
    assert_eq!(find_counter(&entries, "prerender_render_cancelled_total", None), None);
}
