//! Moka snapshot cache implementation.

use std::borrow::Cow;

use async_trait::async_trait;
use moka::future::Cache;
use prerender_core::{CachedSnapshot, SnapshotCache, SnapshotRequest, WriteOutcome};
use tracing::debug;

use crate::builder::{MokaSnapshotCacheBuilder, NoCapacity};

/// In-memory snapshot cache powered by Moka.
///
/// Snapshots are keyed by [`snapshot_key`]: the public host followed by the
/// request target. Only successful, non-empty retrievals are stored and the
/// write hook never cancels a snapshot.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use prerender_moka::MokaSnapshotCache;
///
/// let cache = MokaSnapshotCache::builder()
///     .max_entries(10_000)
///     .ttl(Duration::from_secs(86_400))
///     .build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted**; the cache is lost on process restart
/// - Data is **not shared** across processes
/// - Expiration is best-effort; counts reported by
///   [`entry_count`](Self::entry_count) lag behind until Moka runs its
///   pending maintenance tasks
#[derive(Clone)]
pub struct MokaSnapshotCache {
    pub(crate) cache: Cache<String, String>,
    pub(crate) name: Cow<'static, str>,
}

impl std::fmt::Debug for MokaSnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaSnapshotCache")
            .field("name", &self.name)
            .field("cache", &self.cache)
            .finish()
    }
}

impl MokaSnapshotCache {
    /// Creates a builder. Capacity must be set before building.
    pub fn builder() -> MokaSnapshotCacheBuilder<NoCapacity> {
        MokaSnapshotCacheBuilder::new()
    }

    /// The underlying Moka cache.
    pub fn inner(&self) -> &Cache<String, String> {
        &self.cache
    }

    /// Approximate number of stored snapshots.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Drops the snapshot stored for `request`, if any.
    pub async fn invalidate(&self, request: &SnapshotRequest) {
        self.cache.invalidate(&snapshot_key(request)).await;
    }

    /// Drops every stored snapshot.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

/// Cache key of a request: public host followed by path and query.
pub fn snapshot_key(request: &SnapshotRequest) -> String {
    let host = request.host().unwrap_or_default();
    let url = request.url();
    let mut key = String::with_capacity(host.len() + url.len());
    key.push_str(&host);
    key.push_str(url);
    key
}

#[async_trait]
impl SnapshotCache for MokaSnapshotCache {
    async fn read(&self, request: &SnapshotRequest) -> CachedSnapshot {
        match self.cache.get(&snapshot_key(request)).await {
            Some(body) => CachedSnapshot::hit(body),
            None => CachedSnapshot::miss(),
        }
    }

    async fn write(
        &self,
        request: &SnapshotRequest,
        error: Option<&str>,
        body: Option<&str>,
    ) -> WriteOutcome {
        match (error, body) {
            (None, Some(body)) if !body.is_empty() => {
                let key = snapshot_key(request);
                debug!(cache = %self.name, %key, bytes = body.len(), "Storing snapshot");
                self.cache.insert(key, body.to_owned()).await;
            }
            _ => {}
        }
        WriteOutcome::proceed()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn request(host: &str, uri: &str) -> SnapshotRequest {
        SnapshotRequest::from_request(&Request::get(uri).header("host", host).body(()).unwrap())
    }

    #[test]
    fn test_key_is_host_and_target() {
        assert_eq!(
            snapshot_key(&request("www.example.com", "/a?b=1")),
            "www.example.com/a?b=1"
        );
        let forwarded = SnapshotRequest::from_request(
            &Request::get("/a")
                .header("host", "10.0.0.1")
                .header("x-forwarded-host", "shop.example.com")
                .body(())
                .unwrap(),
        );
        assert_eq!(snapshot_key(&forwarded), "shop.example.com/a");
    }

    #[tokio::test]
    async fn test_only_successful_bodies_are_stored() {
        let cache = MokaSnapshotCache::builder().max_entries(16).build();
        let req = request("www.example.com", "/a");

        assert_eq!(
            cache.write(&req, Some("timeout"), None).await,
            WriteOutcome::proceed()
        );
        assert_eq!(cache.write(&req, None, Some("")).await, WriteOutcome::proceed());
        assert_eq!(cache.read(&req).await, CachedSnapshot::miss());

        cache.write(&req, None, Some("<html>")).await;
        assert_eq!(cache.read(&req).await, CachedSnapshot::hit("<html>"));
    }

    #[tokio::test]
    async fn test_hosts_do_not_share_snapshots() {
        let cache = MokaSnapshotCache::builder().max_entries(16).build();
        cache
            .write(&request("a.example.com", "/"), None, Some("<html>a"))
            .await;

        assert!(cache.read(&request("a.example.com", "/")).await.is_hit());
        assert!(!cache.read(&request("b.example.com", "/")).await.is_hit());
    }

    #[tokio::test]
    async fn test_ports_do_not_share_snapshots() {
        let cache = MokaSnapshotCache::builder().max_entries(16).build();
        let absolute = |uri: &str| {
            SnapshotRequest::from_request(&Request::get(uri).body(()).unwrap())
        };
        let public = absolute("https://shop.example.com/a?b=1");
        let admin = absolute("https://shop.example.com:8443/a?b=1");
        assert_eq!(snapshot_key(&admin), "shop.example.com:8443/a?b=1");

        cache.write(&public, None, Some("<html>public")).await;
        assert!(cache.read(&public).await.is_hit());
        assert_eq!(cache.read(&admin).await, CachedSnapshot::miss());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = MokaSnapshotCache::builder().max_entries(16).build();
        let req = request("www.example.com", "/a");
        cache.write(&req, None, Some("<html>")).await;

        cache.invalidate(&req).await;
        assert_eq!(cache.read(&req).await, CachedSnapshot::miss());
    }
}
