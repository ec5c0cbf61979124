//! Builder for configuring [`MokaSnapshotCache`].

use std::borrow::Cow;
use std::time::Duration;

use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;

use crate::cache::MokaSnapshotCache;

/// Marker type: capacity has not been configured yet.
///
/// Call [`max_entries()`](MokaSnapshotCacheBuilder::max_entries) or
/// [`max_bytes()`](MokaSnapshotCacheBuilder::max_bytes) before `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for [`MokaSnapshotCache`].
///
/// Capacity is required and set with exactly one of
/// [`max_entries`](Self::max_entries) or [`max_bytes`](Self::max_bytes);
/// `build()` is only available afterwards.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use prerender_moka::MokaSnapshotCache;
///
/// let cache = MokaSnapshotCache::builder()
///     .max_bytes(256 * 1024 * 1024)
///     .ttl(Duration::from_secs(3600))
///     .name("snapshots")
///     .build();
/// ```
pub struct MokaSnapshotCacheBuilder<Cap> {
    capacity: Cap,
    ttl: Option<Duration>,
    name: Cow<'static, str>,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaSnapshotCacheBuilder<NoCapacity> {
    /// Creates a builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            ttl: None,
            name: Cow::Borrowed("moka"),
            eviction_policy: None,
        }
    }

    /// Limits the cache to `capacity` snapshots.
    pub fn max_entries(self, capacity: u64) -> MokaSnapshotCacheBuilder<EntryCapacity> {
        MokaSnapshotCacheBuilder {
            capacity: EntryCapacity(capacity),
            ttl: self.ttl,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Limits the cache to approximately `bytes` of keys and bodies.
    pub fn max_bytes(self, bytes: u64) -> MokaSnapshotCacheBuilder<ByteCapacity> {
        MokaSnapshotCacheBuilder {
            capacity: ByteCapacity(bytes),
            ttl: self.ttl,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaSnapshotCacheBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaSnapshotCacheBuilder<Cap> {
    /// Time a snapshot stays servable after it was stored.
    ///
    /// Without a TTL snapshots only leave the cache through eviction.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Name reported in logs and metrics. Default: `"moka"`.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// Default: [`EvictionPolicy::tiny_lfu()`] with entry capacity,
    /// [`EvictionPolicy::lru()`] with byte capacity.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    fn finish(
        builder: CacheBuilder<String, String, Cache<String, String>>,
        ttl: Option<Duration>,
        name: Cow<'static, str>,
    ) -> MokaSnapshotCache {
        let builder = match ttl {
            Some(ttl) => builder.time_to_live(ttl),
            None => builder,
        };
        MokaSnapshotCache {
            cache: builder.build(),
            name,
        }
    }
}

impl MokaSnapshotCacheBuilder<EntryCapacity> {
    /// Builds the cache with entry-count capacity.
    pub fn build(self) -> MokaSnapshotCache {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let builder = Cache::builder()
            .max_capacity(self.capacity.0)
            .eviction_policy(policy);
        Self::finish(builder, self.ttl, self.name)
    }
}

impl MokaSnapshotCacheBuilder<ByteCapacity> {
    /// Builds the cache with byte-based capacity.
    ///
    /// Defaults to LRU eviction so a large snapshot is never refused by the
    /// TinyLFU admission filter while eviction could make room.
    pub fn build(self) -> MokaSnapshotCache {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let builder = Cache::builder()
            .max_capacity(self.capacity.0)
            .weigher(byte_weigher)
            .eviction_policy(policy);
        Self::finish(builder, self.ttl, self.name)
    }
}

fn byte_weigher(key: &String, value: &String) -> u32 {
    (key.len() + value.len()).min(u32::MAX as usize) as u32
}
