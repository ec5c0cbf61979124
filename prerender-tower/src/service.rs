use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Request, Response};
use prerender::{Outcome, Prerender, Retriever, Snapshot, SnapshotCache, SnapshotRequest};
use tower::Service;
use tracing::debug;

use crate::body::PrerenderBody;
use crate::error::PrerenderServiceError;

/// Content type of snapshot responses.
pub const TEXT_HTML_UTF8: HeaderValue = HeaderValue::from_static("text/html; charset=utf-8");

/// Tower service answering crawlers with snapshots and handing every other
/// request to the wrapped service.
///
/// Built by [`PrerenderLayer`](crate::PrerenderLayer).
pub struct PrerenderService<S, C, R> {
    inner: S,
    prerender: Prerender<C, R>,
    status_header: HeaderName,
}

impl<S, C, R> PrerenderService<S, C, R> {
    /// Wraps `inner`.
    pub fn new(inner: S, prerender: Prerender<C, R>, status_header: HeaderName) -> Self {
        PrerenderService {
            inner,
            prerender,
            status_header,
        }
    }

    /// The orchestrator in use.
    pub fn prerender(&self) -> &Prerender<C, R> {
        &self.prerender
    }
}

impl<S, C, R> Clone for PrerenderService<S, C, R>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            prerender: self.prerender.clone(),
            status_header: self.status_header.clone(),
        }
    }
}

impl<S, C, R, ReqBody, ResBody> Service<Request<ReqBody>> for PrerenderService<S, C, R>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
    C: SnapshotCache + 'static,
    R: Retriever + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<PrerenderBody<ResBody>>;
    type Error = PrerenderServiceError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(PrerenderServiceError::Inner)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // The clone is not ready yet; keep it and drive the one that is.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let prerender = self.prerender.clone();
        let status_header = self.status_header.clone();

        async move {
            let snapshot_request = SnapshotRequest::from_request(&req);
            match prerender.render(&snapshot_request).await? {
                Outcome::Snapshot(snapshot) => Ok(snapshot_response(snapshot, status_header)),
                Outcome::Continue(status) => {
                    debug!(url = snapshot_request.url(), %status, "Passing request to inner service");
                    let response = inner
                        .call(req)
                        .await
                        .map_err(PrerenderServiceError::Inner)?;
                    Ok(response.map(PrerenderBody::passthrough))
                }
            }
        }
        .boxed()
    }
}

fn snapshot_response<B>(snapshot: Snapshot, status_header: HeaderName) -> Response<PrerenderBody<B>> {
    let mut response = Response::new(PrerenderBody::snapshot(snapshot.body));
    *response.status_mut() = snapshot.code;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, TEXT_HTML_UTF8);
    headers.insert(
        status_header,
        HeaderValue::from_static(snapshot.status.as_header_value()),
    );
    response
}
