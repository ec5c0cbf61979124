//! Rendering service request construction.
//!
//! The rendering service is addressed as `<service_url><public url>`, where
//! the public URL is rebuilt from the configured scheme, the externally
//! visible host and the request target:
//!
//! ```text
//! http://svc/ + https://www.example.com/products/42?color=red
//! ```

use std::time::Duration;

use http::header::{ACCEPT_ENCODING, HOST, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue};
use prerender_core::SnapshotRequest;

use crate::config::Config;

/// Header carrying the rendering service token.
pub const X_PRERENDER_TOKEN: HeaderName = HeaderName::from_static("x-prerender-token");

/// Compression accepted from the rendering service.
pub const ACCEPT_ENCODING_VALUE: HeaderValue = HeaderValue::from_static("gzip");

/// A fully prepared call to the rendering service.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// Target URL.
    pub url: String,
    /// Outbound headers.
    pub headers: HeaderMap,
    /// Per-call timeout from the configured request options.
    pub timeout: Option<Duration>,
}

impl UpstreamRequest {
    /// Builds the call for an incoming request.
    pub fn new(request: &SnapshotRequest, config: &Config) -> Self {
        Self {
            url: build_upstream_url(request, config),
            headers: build_upstream_headers(request, config),
            timeout: config.request_options().timeout,
        }
    }
}

/// Builds the rendering service URL for a request.
///
/// The host comes from `X-Forwarded-Host`, falling back to `Host` and then
/// to the request URI authority, port included. Path and query are kept as
/// received.
pub fn build_upstream_url(request: &SnapshotRequest, config: &Config) -> String {
    let host = request.host().unwrap_or_default();
    format!(
        "{}{}://{}{}",
        config.service_url(),
        config.scheme(),
        host,
        request.url()
    )
}

/// Builds the outbound header set for a request.
///
/// Layering, later layers winning on conflict:
///
/// 1. headers from the configured request options;
/// 2. every incoming header except `Host`, when header forwarding is on;
/// 3. `User-Agent` of the incoming request and `Accept-Encoding: gzip`;
/// 4. `X-Prerender-Token`, when a token is configured.
pub fn build_upstream_headers(request: &SnapshotRequest, config: &Config) -> HeaderMap {
    let mut headers = config.request_options().headers.clone();

    if config.forward_headers() {
        let incoming = request.headers();
        for name in incoming.keys() {
            if *name == HOST {
                continue;
            }
            headers.remove(name);
            for value in incoming.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    match request.headers().get(USER_AGENT) {
        Some(user_agent) => {
            headers.insert(USER_AGENT, user_agent.clone());
        }
        None => {
            headers.remove(USER_AGENT);
        }
    }
    headers.insert(ACCEPT_ENCODING, ACCEPT_ENCODING_VALUE);

    if let Some(token) = config.token() {
        headers.insert(X_PRERENDER_TOKEN, token.clone());
    }

    headers
}
