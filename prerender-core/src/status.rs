//! Render status reported for every handled request.

/// How a request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStatus {
    /// Snapshot served from the cache.
    Hit,
    /// Snapshot retrieved from the rendering backend.
    #[default]
    Miss,
    /// Request not eligible, handed to the application.
    Bypass,
    /// Cache write cancelled the snapshot, handed to the application.
    Cancelled,
}

impl RenderStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Hit => "hit",
            RenderStatus::Miss => "miss",
            RenderStatus::Bypass => "bypass",
            RenderStatus::Cancelled => "cancelled",
        }
    }

    /// Header value for the status, such as `HIT`.
    #[inline]
    pub const fn as_header_value(&self) -> &'static str {
        match self {
            RenderStatus::Hit => "HIT",
            RenderStatus::Miss => "MISS",
            RenderStatus::Bypass => "BYPASS",
            RenderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
