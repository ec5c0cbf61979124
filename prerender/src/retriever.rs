//! Calls to the rendering service.
//!
//! A [`Retriever`] performs exactly one outbound `GET` per call and never
//! fails: transport problems come back as [`Retrieval::failure`]. Any
//! response that arrives, whatever its status code, is a successful
//! retrieval carrying that body.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use tracing::{debug, warn};

use crate::upstream::UpstreamRequest;

/// Outcome of a call to the rendering service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retrieval {
    /// Status code of the response, when one arrived.
    pub status: Option<StatusCode>,
    /// Response body.
    pub body: Option<String>,
    /// Transport error message.
    pub error: Option<String>,
}

impl Retrieval {
    /// A response was received.
    pub fn success(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            body: Some(body.into()),
            error: None,
        }
    }

    /// No response could be obtained.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: None,
            body: None,
            error: Some(error.into()),
        }
    }

    /// Returns `true` if a transport error was recorded.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Fetches snapshots from a rendering service.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Issues the call described by `request`.
    async fn fetch(&self, request: UpstreamRequest) -> Retrieval;
}

#[async_trait]
impl<T> Retriever for &T
where
    T: Retriever + ?Sized,
{
    async fn fetch(&self, request: UpstreamRequest) -> Retrieval {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Retriever for Box<T>
where
    T: Retriever + ?Sized,
{
    async fn fetch(&self, request: UpstreamRequest) -> Retrieval {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<T> Retriever for Arc<T>
where
    T: Retriever + ?Sized,
{
    async fn fetch(&self, request: UpstreamRequest) -> Retrieval {
        (**self).fetch(request).await
    }
}

/// [`Retriever`] backed by a [`reqwest::Client`].
///
/// The client is cheap to clone and pools connections; build one per process.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use prerender::ReqwestRetriever;
///
/// let client = reqwest::Client::builder()
///     .connect_timeout(Duration::from_secs(2))
///     .build()
///     .unwrap();
/// let retriever = ReqwestRetriever::with_client(client);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReqwestRetriever {
    client: reqwest::Client,
}

impl ReqwestRetriever {
    /// Creates a retriever with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a retriever around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Retriever for ReqwestRetriever {
    async fn fetch(&self, request: UpstreamRequest) -> Retrieval {
        let UpstreamRequest {
            url,
            headers,
            timeout,
        } = request;

        let mut builder = self.client.get(&url).headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(%url, %error, "Rendering service request failed");
                return Retrieval::failure(error.to_string());
            }
        };

        let status = response.status();
        match response.text().await {
            Ok(body) => {
                debug!(%url, %status, bytes = body.len(), "Rendering service responded");
                Retrieval::success(status, body)
            }
            Err(error) => {
                warn!(%url, %status, %error, "Reading rendering service response failed");
                Retrieval::failure(error.to_string())
            }
        }
    }
}
