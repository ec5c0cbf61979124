//! Request descriptor evaluated by the classifier and the cache.

use std::borrow::Cow;

use http::header::{HOST, REFERER, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, request::Parts};

/// Header set by reverse proxies with the externally visible host.
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Immutable view of an incoming request.
///
/// Holds the method, URI and headers of the request, detached from its body
/// so the descriptor can be shared with cache backends while the original
/// request keeps flowing to the wrapped service.
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl SnapshotRequest {
    /// Creates a descriptor from its components.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }

    /// Creates a descriptor from request parts.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(parts.method.clone(), parts.uri.clone(), parts.headers.clone())
    }

    /// Creates a descriptor from a request, leaving the request untouched.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::new(
            request.method().clone(),
            request.uri().clone(),
            request.headers().clone(),
        )
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI as received.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of a header, if present.
    ///
    /// Lookup is case-insensitive. Bytes that are not valid UTF-8 are
    /// replaced with `U+FFFD`, so a present header is never reported as
    /// missing.
    pub fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers.get(name).map(lossy)
    }

    /// Returns `true` if the header is present, whatever its value.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// The `User-Agent` header.
    pub fn user_agent(&self) -> Option<Cow<'_, str>> {
        self.headers.get(USER_AGENT).map(lossy)
    }

    /// The `Referer` header.
    pub fn referer(&self) -> Option<Cow<'_, str>> {
        self.headers.get(REFERER).map(lossy)
    }

    /// URI path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Request target: path followed by the query string.
    ///
    /// Whitelist and blacklist patterns are matched against this value.
    pub fn url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Returns the value of a query parameter.
    ///
    /// Parameters are percent-decoded; the first occurrence wins.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Externally visible host, port included when one was given.
    ///
    /// Prefers `X-Forwarded-Host`, then `Host`, then the URI authority. A
    /// later source is only consulted when the earlier header is absent.
    pub fn host(&self) -> Option<Cow<'_, str>> {
        match self
            .headers
            .get(X_FORWARDED_HOST)
            .or_else(|| self.headers.get(HOST))
        {
            Some(value) => Some(lossy(value)),
            None => self
                .uri
                .authority()
                .map(|authority| Cow::Borrowed(authority.as_str())),
        }
    }
}

fn lossy(value: &HeaderValue) -> Cow<'_, str> {
    String::from_utf8_lossy(value.as_bytes())
}

impl From<&Parts> for SnapshotRequest {
    fn from(parts: &Parts) -> Self {
        Self::from_parts(parts)
    }
}
