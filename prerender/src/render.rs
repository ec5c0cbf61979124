//! Request orchestration.
//!
//! [`Prerender`] runs one request through the snapshot pipeline:
//!
//! ```text
//! classify ──ineligible──▶ Continue(Bypass)
//!    │
//!    ▼
//! cache read ──hit──▶ Snapshot(Hit)
//!    │ miss (or read error)
//!    ▼
//! retrieve ─▶ cache write ──cancel──▶ Continue(Cancelled)
//!                 │
//!                 ├─ transport error ─▶ Err(RenderError::Upstream)
//!                 └─ body ────────────▶ Snapshot(Miss)
//! ```
//!
//! Every step is awaited in sequence; nothing is shared between requests
//! besides the configuration and whatever the cache stores.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use prerender_core::{Eligibility, NoCache, RenderStatus, SnapshotCache, SnapshotRequest};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::RenderError;
use crate::metrics;
use crate::retriever::{ReqwestRetriever, Retrieval, Retriever};
use crate::upstream::UpstreamRequest;

/// A snapshot ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Where the snapshot came from, [`RenderStatus::Hit`] or
    /// [`RenderStatus::Miss`].
    pub status: RenderStatus,
    /// Status code reported by the rendering service; `200 OK` for cached
    /// snapshots.
    pub code: StatusCode,
    /// Snapshot body.
    pub body: String,
}

/// Result of [`Prerender::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this snapshot.
    Snapshot(Snapshot),
    /// Let the application handle the request, either because it is not
    /// eligible ([`RenderStatus::Bypass`]) or because the cache write
    /// cancelled the snapshot ([`RenderStatus::Cancelled`]).
    Continue(RenderStatus),
}

impl Outcome {
    /// Render status of this outcome.
    pub fn status(&self) -> RenderStatus {
        match self {
            Outcome::Snapshot(snapshot) => snapshot.status,
            Outcome::Continue(status) => *status,
        }
    }
}

/// Result of [`Prerender::handle`].
#[derive(Debug)]
pub enum Handled<T> {
    /// A snapshot was produced; the continuation was not called.
    Snapshot(Snapshot),
    /// The continuation ran and produced this value.
    Continued(T),
}

/// Snapshot orchestrator.
///
/// Cheap to clone; the configuration, cache and retriever are shared.
///
/// # Type Parameters
///
/// * `C` - Cache adapter. Default: [`NoCache`].
/// * `R` - Rendering service client. Default: [`ReqwestRetriever`].
pub struct Prerender<C = NoCache, R = ReqwestRetriever> {
    config: Arc<Config>,
    cache: Arc<C>,
    retriever: Arc<R>,
}

impl<C, R> Clone for Prerender<C, R> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            cache: Arc::clone(&self.cache),
            retriever: Arc::clone(&self.retriever),
        }
    }
}

impl<C, R> std::fmt::Debug for Prerender<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prerender")
            .field("config", &self.config)
            .field("cache", &std::any::type_name::<C>())
            .field("retriever", &std::any::type_name::<R>())
            .finish()
    }
}

impl Prerender<NoCache, ReqwestRetriever> {
    /// Creates a builder with the default configuration, no cache and a
    /// reqwest-based retriever.
    pub fn builder() -> PrerenderBuilder<NoCache, ReqwestRetriever> {
        PrerenderBuilder::default()
    }
}

impl<C, R> Prerender<C, R> {
    /// Creates an orchestrator from its parts.
    pub fn new(config: Arc<Config>, cache: Arc<C>, retriever: Arc<R>) -> Self {
        Self {
            config,
            cache,
            retriever,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cache adapter in use.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Retriever in use.
    pub fn retriever(&self) -> &R {
        &self.retriever
    }
}

impl<C, R> Prerender<C, R>
where
    C: SnapshotCache,
    R: Retriever,
{
    /// Runs the snapshot pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the rendering service could not be
    /// reached and the cache write did not cancel the snapshot.
    pub async fn render(&self, request: &SnapshotRequest) -> Result<Outcome, RenderError> {
        if let Eligibility::Ineligible(rejection) = self.config.classifier().classify(request) {
            metrics::record_bypass(rejection.as_str());
            return Ok(Outcome::Continue(RenderStatus::Bypass));
        }

        let cache_name = self.cache.name();
        let cached = self.cache.read(request).await;
        if let Some(error) = &cached.error {
            warn!(cache = cache_name, url = request.url(), %error, "Cache read failed, treating as miss");
        }
        if let Some(body) = cached.into_hit() {
            debug!(cache = cache_name, url = request.url(), "Serving cached snapshot");
            metrics::record_hit(cache_name);
            return Ok(Outcome::Snapshot(Snapshot {
                status: RenderStatus::Hit,
                code: StatusCode::OK,
                body,
            }));
        }
        metrics::record_miss(cache_name);

        let upstream = UpstreamRequest::new(request, &self.config);
        debug!(upstream_url = %upstream.url, "Fetching snapshot from rendering service");
        let started = Instant::now();
        let retrieval = self.retriever.fetch(upstream).await;
        metrics::record_upstream_duration(started.elapsed());

        let write = self
            .cache
            .write(
                request,
                retrieval.error.as_deref(),
                retrieval.body.as_deref(),
            )
            .await;
        if write.cancel_render {
            debug!(url = request.url(), "Snapshot cancelled by cache write");
            metrics::record_cancelled();
            return Ok(Outcome::Continue(RenderStatus::Cancelled));
        }

        match retrieval {
            Retrieval {
                error: Some(error), ..
            } => {
                warn!(url = request.url(), %error, "Snapshot could not be delivered");
                metrics::record_error();
                Err(RenderError::Upstream(error))
            }
            Retrieval {
                body: Some(body),
                status,
                ..
            } => Ok(Outcome::Snapshot(Snapshot {
                status: RenderStatus::Miss,
                code: status.unwrap_or(StatusCode::OK),
                body,
            })),
            Retrieval { .. } => {
                metrics::record_error();
                Err(RenderError::EmptyResponse)
            }
        }
    }

    /// Runs the snapshot pipeline, calling `next` when the application
    /// should answer instead.
    ///
    /// `next` is called at most once and never when a snapshot is produced.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render); `next` is not called on error.
    pub async fn handle<F, Fut, T>(
        &self,
        request: &SnapshotRequest,
        next: F,
    ) -> Result<Handled<T>, RenderError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        match self.render(request).await? {
            Outcome::Snapshot(snapshot) => Ok(Handled::Snapshot(snapshot)),
            Outcome::Continue(_) => Ok(Handled::Continued(next().await)),
        }
    }
}

/// Builder for [`Prerender`].
pub struct PrerenderBuilder<C, R> {
    config: Option<Config>,
    cache: C,
    retriever: R,
}

impl Default for PrerenderBuilder<NoCache, ReqwestRetriever> {
    fn default() -> Self {
        Self {
            config: None,
            cache: NoCache,
            retriever: ReqwestRetriever::default(),
        }
    }
}

impl<C, R> PrerenderBuilder<C, R> {
    /// Sets the configuration. Defaults to [`Config::default`].
    pub fn config(self, config: Config) -> Self {
        Self {
            config: Some(config),
            ..self
        }
    }

    /// Sets the cache adapter.
    pub fn cache<NC: SnapshotCache>(self, cache: NC) -> PrerenderBuilder<NC, R> {
        PrerenderBuilder {
            config: self.config,
            cache,
            retriever: self.retriever,
        }
    }

    /// Sets the rendering service client.
    pub fn retriever<NR: Retriever>(self, retriever: NR) -> PrerenderBuilder<C, NR> {
        PrerenderBuilder {
            config: self.config,
            cache: self.cache,
            retriever,
        }
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Prerender<C, R> {
        Prerender {
            config: Arc::new(self.config.unwrap_or_default()),
            cache: Arc::new(self.cache),
            retriever: Arc::new(self.retriever),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use http::Request;
    use prerender_core::{CachedSnapshot, WriteOutcome};

    const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1)";

    #[derive(Default)]
    struct StubRetriever {
        response: Retrieval,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl StubRetriever {
        fn new(response: Retrieval) -> Self {
            Self {
                response,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn fetch(&self, request: UpstreamRequest) -> Retrieval {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(request.url);
            self.response.clone()
        }
    }

    #[derive(Default)]
    struct RecordingCache {
        read: CachedSnapshot,
        outcome: WriteOutcome,
        writes: Mutex<Vec<(Option<String>, Option<String>)>>,
    }

    #[async_trait]
    impl SnapshotCache for RecordingCache {
        async fn read(&self, _request: &SnapshotRequest) -> CachedSnapshot {
            self.read.clone()
        }

        async fn write(
            &self,
            _request: &SnapshotRequest,
            error: Option<&str>,
            body: Option<&str>,
        ) -> WriteOutcome {
            self.writes
                .lock()
                .unwrap()
                .push((error.map(str::to_owned), body.map(str::to_owned)));
            self.outcome
        }
    }

    fn crawler_request(uri: &str) -> SnapshotRequest {
        SnapshotRequest::from_request(
            &Request::get(uri)
                .header("user-agent", GOOGLEBOT)
                .header("host", "www.example.com")
                .body(())
                .unwrap(),
        )
    }

    fn prerender(
        cache: RecordingCache,
        retriever: StubRetriever,
    ) -> Prerender<RecordingCache, StubRetriever> {
        let config = Config::builder()
            .service_url("http://render.local")
            .build()
            .unwrap();
        Prerender::builder()
            .config(config)
            .cache(cache)
            .retriever(retriever)
            .build()
    }

    #[tokio::test]
    async fn test_not_eligible_bypasses_everything() {
        let prerender = prerender(
            RecordingCache::default(),
            StubRetriever::new(Retrieval::success(StatusCode::OK, "<html>")),
        );
        let request = SnapshotRequest::from_request(&Request::get("/").body(()).unwrap());

        let outcome = prerender.render(&request).await.unwrap();

        assert_eq!(outcome, Outcome::Continue(RenderStatus::Bypass));
        assert_eq!(prerender.retriever().calls.load(Ordering::SeqCst), 0);
        assert!(prerender.cache().writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_retriever_and_write() {
        let cache = RecordingCache {
            read: CachedSnapshot::hit("<html>cached</html>"),
            ..Default::default()
        };
        let prerender = prerender(cache, StubRetriever::default());

        let outcome = prerender.render(&crawler_request("/a")).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Snapshot(Snapshot {
                status: RenderStatus::Hit,
                code: StatusCode::OK,
                body: "<html>cached</html>".to_owned(),
            })
        );
        assert_eq!(prerender.retriever().calls.load(Ordering::SeqCst), 0);
        assert!(prerender.cache().writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_read_error_is_a_miss() {
        let cache = RecordingCache {
            read: CachedSnapshot {
                body: Some("<html>stale</html>".to_owned()),
                error: Some("backend down".to_owned()),
            },
            ..Default::default()
        };
        let prerender = prerender(
            cache,
            StubRetriever::new(Retrieval::success(StatusCode::OK, "<html>fresh</html>")),
        );

        let outcome = prerender.render(&crawler_request("/a")).await.unwrap();

        assert_eq!(outcome.status(), RenderStatus::Miss);
        assert_eq!(prerender.retriever().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_miss_writes_exact_outcome() {
        let prerender = prerender(
            RecordingCache::default(),
            StubRetriever::new(Retrieval::success(StatusCode::OK, "<html>")),
        );

        let outcome = prerender.render(&crawler_request("/a?b=1")).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Snapshot(Snapshot {
                status: RenderStatus::Miss,
                code: StatusCode::OK,
                body: "<html>".to_owned(),
            })
        );
        assert_eq!(
            *prerender.cache().writes.lock().unwrap(),
            vec![(None, Some("<html>".to_owned()))]
        );
        assert_eq!(
            *prerender.retriever().urls.lock().unwrap(),
            vec!["http://render.local/https://www.example.com/a?b=1".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_still_a_snapshot() {
        let prerender = prerender(
            RecordingCache::default(),
            StubRetriever::new(Retrieval::success(StatusCode::NOT_FOUND, "<html>404</html>")),
        );

        let outcome = prerender.render(&crawler_request("/gone")).await.unwrap();

        match outcome {
            Outcome::Snapshot(snapshot) => {
                assert_eq!(snapshot.code, StatusCode::NOT_FOUND);
                assert_eq!(snapshot.body, "<html>404</html>");
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_wins_over_error() {
        let cache = RecordingCache {
            outcome: WriteOutcome::cancel(),
            ..Default::default()
        };
        let prerender = prerender(
            cache,
            StubRetriever::new(Retrieval::failure("connection refused")),
        );

        let outcome = prerender.render(&crawler_request("/a")).await.unwrap();

        assert_eq!(outcome, Outcome::Continue(RenderStatus::Cancelled));
        assert_eq!(
            *prerender.cache().writes.lock().unwrap(),
            vec![(Some("connection refused".to_owned()), None)]
        );
    }

    #[tokio::test]
    async fn test_cancel_wins_over_success() {
        let cache = RecordingCache {
            outcome: WriteOutcome::cancel(),
            ..Default::default()
        };
        let prerender = prerender(
            cache,
            StubRetriever::new(Retrieval::success(StatusCode::OK, "<html>")),
        );

        let outcome = prerender.render(&crawler_request("/a")).await.unwrap();
        assert_eq!(outcome, Outcome::Continue(RenderStatus::Cancelled));
    }

    #[tokio::test]
    async fn test_uncancelled_error_propagates() {
        let prerender = prerender(
            RecordingCache::default(),
            StubRetriever::new(Retrieval::failure("connection refused")),
        );

        let err = prerender.render(&crawler_request("/a")).await.unwrap_err();

        assert_eq!(err, RenderError::Upstream("connection refused".to_owned()));
        assert_eq!(prerender.cache().writes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_an_error() {
        let prerender = prerender(RecordingCache::default(), StubRetriever::default());

        let err = prerender.render(&crawler_request("/a")).await.unwrap_err();
        assert_eq!(err, RenderError::EmptyResponse);
    }

    #[tokio::test]
    async fn test_handle_calls_continuation_only_when_continuing() {
        let prerender = prerender(
            RecordingCache::default(),
            StubRetriever::new(Retrieval::success(StatusCode::OK, "<html>")),
        );

        let browser = SnapshotRequest::from_request(
            &Request::get("/")
                .header("user-agent", "Mozilla/5.0 Firefox/120.0")
                .body(())
                .unwrap(),
        );
        let handled = prerender.handle(&browser, || async { "app" }).await.unwrap();
        assert!(matches!(handled, Handled::Continued("app")));

        let called = AtomicUsize::new(0);
        let handled = prerender
            .handle(&crawler_request("/"), || async {
                called.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        assert!(matches!(handled, Handled::Snapshot(_)));
        assert_eq!(called.load(Ordering::SeqCst), 0);
    }
}
