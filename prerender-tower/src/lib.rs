//! Tower middleware serving prerendered snapshots to crawlers.
//!
//! [`PrerenderLayer`] wraps any tower HTTP service. Each request is
//! classified; crawlers get a snapshot from the cache or the rendering
//! service, and everything else goes to the wrapped service untouched.
//!
//! # Quick Start
//!
//! ```ignore
//! use prerender::Config;
//! use prerender_tower::PrerenderLayer;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let layer = PrerenderLayer::builder()
//!     .config(Config::builder().with_env().build()?)
//!     .build();
//!
//! let service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(service_fn(|_req| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new("Hello"))
//!     }));
//! ```
//!
//! # Response Headers
//!
//! Snapshot responses carry `content-type: text/html; charset=utf-8`, the
//! status code reported by the rendering service (`200` for cached
//! snapshots), and a status header:
//!
//! | Header Value | Meaning |
//! |--------------|---------|
//! | `HIT` | Snapshot served from the cache |
//! | `MISS` | Snapshot fetched from the rendering service |
//!
//! The default header name is `x-prerender-cache`. Customize it with
//! [`PrerenderLayerBuilder::status_header`]. Responses of the wrapped service
//! are not modified.
//!
//! # Errors
//!
//! When a snapshot was due and the rendering service could not be reached,
//! the service fails with [`PrerenderServiceError::Render`]; map it to a
//! response (for example with axum's `HandleErrorLayer`).

#![warn(missing_docs)]

/// Response body type.
pub mod body;
/// Service error type.
pub mod error;
/// Tower layer and builder.
pub mod layer;
/// The Tower service implementation.
pub mod service;

pub use body::PrerenderBody;
pub use error::PrerenderServiceError;
pub use layer::{DEFAULT_STATUS_HEADER, PrerenderLayer, PrerenderLayerBuilder};
pub use service::PrerenderService;
