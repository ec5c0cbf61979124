//! Error types.

use thiserror::Error;

/// Error raised while building a [`Config`](crate::Config).
///
/// All of these are deployment mistakes; they surface once, when the
/// configuration is built, never while serving requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A whitelist or blacklist pattern is not a valid regular expression.
    #[error("invalid regex pattern '{pattern}': {error}")]
    InvalidRegex {
        /// Pattern source.
        pattern: String,
        /// Compilation error.
        #[source]
        error: regex::Error,
    },

    /// An extra request header has an invalid name.
    #[error("invalid header name '{0}': {1}")]
    InvalidHeaderName(String, #[source] http::header::InvalidHeaderName),

    /// An extra request header or the token has an invalid value.
    #[error("invalid value for header '{0}': {1}")]
    InvalidHeaderValue(String, #[source] http::header::InvalidHeaderValue),

    /// The rendering service URL does not parse.
    #[error("invalid rendering service url '{url}': {error}")]
    InvalidServiceUrl {
        /// Configured URL.
        url: String,
        /// Parse error.
        #[source]
        error: url::ParseError,
    },

    /// The outbound scheme is empty or contains characters not allowed in a
    /// URL scheme.
    #[error("invalid outbound scheme '{0}'")]
    InvalidScheme(String),

    /// The configuration document could not be deserialized.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Error returned when a snapshot was due but could not be delivered.
///
/// The hosting framework decides which response this becomes, typically
/// `502 Bad Gateway`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The rendering service could not be reached or its response could not
    /// be read.
    #[error("rendering service request failed: {0}")]
    Upstream(String),

    /// The retriever reported neither a body nor an error.
    #[error("rendering service returned no content")]
    EmptyResponse,
}
