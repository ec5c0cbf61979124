use http::HeaderName;
use prerender::{Config, NoCache, Prerender, PrerenderBuilder, ReqwestRetriever, Retriever, SnapshotCache};
use tower::Layer;

use crate::service::PrerenderService;

/// Default name of the header reporting where a snapshot came from.
pub const DEFAULT_STATUS_HEADER: HeaderName = HeaderName::from_static("x-prerender-cache");

/// Tower layer serving prerendered snapshots to crawlers.
///
/// # Examples
///
/// ```
/// use prerender::Config;
/// use prerender_tower::PrerenderLayer;
///
/// let layer = PrerenderLayer::builder()
///     .config(
///         Config::builder()
///             .service_url("http://localhost:3000")
///             .build()
///             .unwrap(),
///     )
///     .build();
/// ```
pub struct PrerenderLayer<C = NoCache, R = ReqwestRetriever> {
    prerender: Prerender<C, R>,
    status_header: HeaderName,
}

impl<C, R> Clone for PrerenderLayer<C, R> {
    fn clone(&self) -> Self {
        Self {
            prerender: self.prerender.clone(),
            status_header: self.status_header.clone(),
        }
    }
}

impl<C, R> PrerenderLayer<C, R> {
    /// Creates a layer around an existing orchestrator.
    pub fn new(prerender: Prerender<C, R>) -> Self {
        Self {
            prerender,
            status_header: DEFAULT_STATUS_HEADER,
        }
    }
}

impl PrerenderLayer<NoCache, ReqwestRetriever> {
    /// Creates a builder with the default configuration, no cache and a
    /// reqwest-based retriever.
    pub fn builder() -> PrerenderLayerBuilder<NoCache, ReqwestRetriever> {
        PrerenderLayerBuilder::default()
    }
}

impl<C, R> From<Prerender<C, R>> for PrerenderLayer<C, R> {
    fn from(prerender: Prerender<C, R>) -> Self {
        Self::new(prerender)
    }
}

impl<S, C, R> Layer<S> for PrerenderLayer<C, R> {
    type Service = PrerenderService<S, C, R>;

    fn layer(&self, inner: S) -> Self::Service {
        PrerenderService::new(inner, self.prerender.clone(), self.status_header.clone())
    }
}

/// Builder for [`PrerenderLayer`].
pub struct PrerenderLayerBuilder<C, R> {
    prerender: PrerenderBuilder<C, R>,
    status_header: HeaderName,
}

impl Default for PrerenderLayerBuilder<NoCache, ReqwestRetriever> {
    fn default() -> Self {
        Self {
            prerender: Prerender::builder(),
            status_header: DEFAULT_STATUS_HEADER,
        }
    }
}

impl<C, R> PrerenderLayerBuilder<C, R> {
    /// Sets the configuration.
    pub fn config(self, config: Config) -> Self {
        Self {
            prerender: self.prerender.config(config),
            ..self
        }
    }

    /// Sets the cache adapter.
    pub fn cache<NC: SnapshotCache>(self, cache: NC) -> PrerenderLayerBuilder<NC, R> {
        PrerenderLayerBuilder {
            prerender: self.prerender.cache(cache),
            status_header: self.status_header,
        }
    }

    /// Sets the rendering service client.
    pub fn retriever<NR: Retriever>(self, retriever: NR) -> PrerenderLayerBuilder<C, NR> {
        PrerenderLayerBuilder {
            prerender: self.prerender.retriever(retriever),
            status_header: self.status_header,
        }
    }

    /// Sets the header reporting `HIT` or `MISS` on snapshot responses.
    ///
    /// Default: [`DEFAULT_STATUS_HEADER`].
    pub fn status_header(self, status_header: HeaderName) -> Self {
        Self {
            status_header,
            ..self
        }
    }

    /// Builds the layer.
    pub fn build(self) -> PrerenderLayer<C, R> {
        PrerenderLayer {
            prerender: self.prerender.build(),
            status_header: self.status_header,
        }
    }
}
