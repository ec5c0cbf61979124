//! Metrics declaration and recording.
//!
//! Enable the `metrics` feature to emit through the [`metrics`] facade.
//! Without it every recording function is a no-op.
//!
//! ## Metrics
//!
//! - `prerender_cache_hit_total` - snapshots served from the cache
//! - `prerender_cache_miss_total` - snapshots fetched from the rendering service
//! - `prerender_bypass_total` - requests handed to the application, by reason
//! - `prerender_render_cancelled_total` - snapshots cancelled by the cache write
//! - `prerender_render_error_total` - snapshots that could not be delivered
//! - `prerender_upstream_duration_seconds` - rendering service call latency
//!
//! [`metrics`]: https://docs.rs/metrics

use std::time::Duration;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of snapshots served from the cache.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_cache_hit_total",
            "Total number of snapshots served from the cache."
        );
        "prerender_cache_hit_total"
    };
    /// Track number of snapshots fetched from the rendering service.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_cache_miss_total",
            "Total number of snapshots fetched from the rendering service."
        );
        "prerender_cache_miss_total"
    };
    /// Track number of requests handed to the application.
    pub static ref BYPASS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_bypass_total",
            "Total number of requests not eligible for a snapshot."
        );
        "prerender_bypass_total"
    };
    /// Track number of snapshots cancelled by the cache write hook.
    pub static ref CANCELLED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_render_cancelled_total",
            "Total number of snapshots cancelled by the cache write hook."
        );
        "prerender_render_cancelled_total"
    };
    /// Track number of snapshots that could not be delivered.
    pub static ref ERROR_COUNTER: &'static str = {
        metrics::describe_counter!(
            "prerender_render_error_total",
            "Total number of snapshots that could not be delivered."
        );
        "prerender_render_error_total"
    };
    /// Histogram of rendering service call duration.
    pub static ref UPSTREAM_DURATION: &'static str = {
        metrics::describe_histogram!(
            "prerender_upstream_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of rendering service calls in seconds."
        );
        "prerender_upstream_duration_seconds"
    };
}

/// Record a cache hit.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_hit(cache: &str) {
    metrics::counter!(*CACHE_HIT_COUNTER, "cache" => cache.to_string()).increment(1);
}

/// Record a cache miss.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_miss(cache: &str) {
    metrics::counter!(*CACHE_MISS_COUNTER, "cache" => cache.to_string()).increment(1);
}

/// Record a request handed to the application.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_bypass(reason: &'static str) {
    metrics::counter!(*BYPASS_COUNTER, "reason" => reason).increment(1);
}

/// Record a snapshot cancelled by the cache write hook.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cancelled() {
    metrics::counter!(*CANCELLED_COUNTER).increment(1);
}

/// Record a snapshot that could not be delivered.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_error() {
    metrics::counter!(*ERROR_COUNTER).increment(1);
}

/// Record the duration of a rendering service call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_upstream_duration(duration: Duration) {
    metrics::histogram!(*UPSTREAM_DURATION).record(duration.as_secs_f64());
}

/// Record a cache hit (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_hit(_cache: &str) {}

/// Record a cache miss (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_miss(_cache: &str) {}

/// Record a bypass (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_bypass(_reason: &'static str) {}

/// Record a cancellation (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cancelled() {}

/// Record a delivery error (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_error() {}

/// Record an upstream duration (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_upstream_duration(_duration: Duration) {}
