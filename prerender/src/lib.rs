#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Configuration types.
///
/// [`Config`] is built once at startup, from code with [`Config::builder`]
/// or from YAML with [`ConfigFile`], and validated eagerly: a bad pattern,
/// header or service URL is reported before any request is served.
pub mod config;

/// Error types.
///
/// - [`ConfigError`] for configuration mistakes
/// - [`RenderError`] for snapshots that could not be delivered
pub mod error;

/// Metrics collection for snapshot observability.
///
/// When the `metrics` feature is enabled, this module records counters for
/// cache hits, misses, bypasses, cancellations and errors, and a histogram
/// of rendering service latency.
pub mod metrics;

/// Request orchestration.
pub mod render;

/// Rendering service client.
pub mod retriever;

/// Rendering service request construction.
pub mod upstream;

pub use config::{Config, ConfigBuilder, ConfigFile, Patterns, RequestOptions};
pub use error::{ConfigError, RenderError};
pub use render::{Handled, Outcome, Prerender, PrerenderBuilder, Snapshot};
pub use retriever::{ReqwestRetriever, Retrieval, Retriever};
pub use upstream::UpstreamRequest;

pub use prerender_core::{
    CachedSnapshot, Classifier, Eligibility, NoCache, PatternList, Rejection, RenderStatus,
    RuleCatalog, SnapshotCache, SnapshotRequest, WriteOutcome,
};
