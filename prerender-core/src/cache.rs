//! Snapshot cache contract.
//!
//! A [`SnapshotCache`] is consulted once before the rendering backend is
//! called ([`read`](SnapshotCache::read)) and once after every retrieval
//! attempt ([`write`](SnapshotCache::write)). Storage, keys and eviction are
//! entirely up to the implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::request::SnapshotRequest;

/// Result of a cache read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedSnapshot {
    /// Cached snapshot body.
    pub body: Option<String>,
    /// Error reported by the storage backend.
    pub error: Option<String>,
}

impl CachedSnapshot {
    /// A cached body.
    pub fn hit(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            error: None,
        }
    }

    /// Nothing cached.
    pub fn miss() -> Self {
        Self::default()
    }

    /// The storage backend failed. Treated as a miss.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            body: None,
            error: Some(error.into()),
        }
    }

    /// A hit has no error and a non-empty body.
    pub fn is_hit(&self) -> bool {
        self.error.is_none() && self.body.as_deref().is_some_and(|body| !body.is_empty())
    }

    /// Returns the body when this is a hit.
    pub fn into_hit(self) -> Option<String> {
        if self.is_hit() { self.body } else { None }
    }
}

/// Result of a cache write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Drop the snapshot and let the application handle the request.
    pub cancel_render: bool,
}

impl WriteOutcome {
    /// Keep the snapshot path.
    pub const fn proceed() -> Self {
        Self {
            cancel_render: false,
        }
    }

    /// Divert the request to the application.
    pub const fn cancel() -> Self {
        Self {
            cancel_render: true,
        }
    }
}

/// Read and write hooks for snapshot storage.
///
/// Both methods default to no-ops: `read` reports a miss and `write` keeps
/// the snapshot path. Implement only the side you need.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use prerender_core::{CachedSnapshot, SnapshotCache, SnapshotRequest};
///
/// struct Landing;
///
/// #[async_trait]
/// impl SnapshotCache for Landing {
///     async fn read(&self, request: &SnapshotRequest) -> CachedSnapshot {
///         if request.path() == "/" {
///             CachedSnapshot::hit("<html>landing</html>")
///         } else {
///             CachedSnapshot::miss()
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Looks up a stored snapshot for the request.
    async fn read(&self, _request: &SnapshotRequest) -> CachedSnapshot {
        CachedSnapshot::miss()
    }

    /// Receives the outcome of a fresh retrieval.
    ///
    /// `error` is set when the rendering backend could not be reached; `body`
    /// holds the retrieved page otherwise.
    async fn write(
        &self,
        _request: &SnapshotRequest,
        _error: Option<&str>,
        _body: Option<&str>,
    ) -> WriteOutcome {
        WriteOutcome::default()
    }

    /// Name of this cache, used in logs.
    fn name(&self) -> &str {
        "cache"
    }
}

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

#[async_trait]
impl SnapshotCache for NoCache {
    fn name(&self) -> &str {
        "none"
    }
}

#[async_trait]
impl<T> SnapshotCache for &T
where
    T: SnapshotCache + ?Sized,
{
    async fn read(&self, request: &SnapshotRequest) -> CachedSnapshot {
        (**self).read(request).await
    }

    async fn write(
        &self,
        request: &SnapshotRequest,
        error: Option<&str>,
        body: Option<&str>,
    ) -> WriteOutcome {
        (**self).write(request, error, body).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T> SnapshotCache for Box<T>
where
    T: SnapshotCache + ?Sized,
{
    async fn read(&self, request: &SnapshotRequest) -> CachedSnapshot {
        (**self).read(request).await
    }

    async fn write(
        &self,
        request: &SnapshotRequest,
        error: Option<&str>,
        body: Option<&str>,
    ) -> WriteOutcome {
        (**self).write(request, error, body).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T> SnapshotCache for Arc<T>
where
    T: SnapshotCache + ?Sized,
{
    async fn read(&self, request: &SnapshotRequest) -> CachedSnapshot {
        (**self).read(request).await
    }

    async fn write(
        &self,
        request: &SnapshotRequest,
        error: Option<&str>,
        body: Option<&str>,
    ) -> WriteOutcome {
        (**self).write(request, error, body).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
