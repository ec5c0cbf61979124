//! Serializable configuration document.

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Config, ConfigBuilder};
use crate::error::ConfigError;

/// A single pattern or a list of patterns.
///
/// ```yaml
/// # Single pattern
/// whitelist: "^/public/"
///
/// # List of patterns
/// blacklist:
///   - "^/admin"
///   - "\\?preview="
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Patterns {
    /// One pattern.
    Single(String),
    /// Ordered list of patterns.
    List(Vec<String>),
}

impl Patterns {
    /// Normalizes to a list; a single pattern becomes a one-element list.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Patterns::Single(pattern) => vec![pattern],
            Patterns::List(patterns) => patterns,
        }
    }
}

impl From<&str> for Patterns {
    fn from(pattern: &str) -> Self {
        Patterns::Single(pattern.to_owned())
    }
}

impl From<String> for Patterns {
    fn from(pattern: String) -> Self {
        Patterns::Single(pattern)
    }
}

impl From<Vec<String>> for Patterns {
    fn from(patterns: Vec<String>) -> Self {
        Patterns::List(patterns)
    }
}

impl From<Vec<&str>> for Patterns {
    fn from(patterns: Vec<&str>) -> Self {
        Patterns::List(patterns.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for Patterns {
    fn from(patterns: &[&str]) -> Self {
        Patterns::List(patterns.iter().map(|p| (*p).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Patterns {
    fn from(patterns: [&str; N]) -> Self {
        Patterns::List(patterns.iter().map(|p| (*p).to_owned()).collect())
    }
}

/// Extra options for rendering service calls.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RequestOptionsFile {
    /// Headers added to every call, in order.
    pub headers: IndexMap<String, String>,
    /// Per-call timeout (e.g. "10s", "1500ms").
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Configuration document, typically read from YAML.
///
/// ```yaml
/// service_url: http://localhost:3000
/// token: secret
/// forward_headers: true
/// request_options:
///   headers:
///     X-Render-Priority: low
///   timeout: 20s
/// whitelist: "^/products/"
/// blacklist:
///   - "^/admin"
/// crawler_user_agents:
///   - AcmeBot
/// extensions_to_ignore:
///   - .wasm
/// ```
///
/// `crawler_user_agents` and `extensions_to_ignore` extend the built-in
/// catalog instead of replacing it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    /// Rendering service base URL.
    pub service_url: Option<String>,
    /// Scheme of the public URL handed to the rendering service.
    pub scheme: Option<String>,
    /// Forward incoming headers to the rendering service.
    pub forward_headers: bool,
    /// Rendering service token.
    pub token: Option<String>,
    /// Extra options for rendering service calls.
    pub request_options: RequestOptionsFile,
    /// Allow-list of URL patterns.
    pub whitelist: Option<Patterns>,
    /// Deny-list of URL and referer patterns.
    pub blacklist: Option<Patterns>,
    /// Additional crawler user agent substrings.
    pub crawler_user_agents: Vec<String>,
    /// Additional static-asset suffixes.
    pub extensions_to_ignore: Vec<String>,
}

impl ConfigFile {
    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Converts the document into a builder, leaving room for further
    /// adjustments such as [`ConfigBuilder::with_env`].
    pub fn into_builder(self) -> ConfigBuilder {
        let mut builder = Config::builder().forward_headers(self.forward_headers);

        if let Some(service_url) = self.service_url {
            builder = builder.service_url(service_url);
        }
        if let Some(scheme) = self.scheme {
            builder = builder.scheme(scheme);
        }
        if let Some(token) = self.token {
            builder = builder.token(token);
        }
        for (name, value) in self.request_options.headers {
            builder = builder.request_header(name, value);
        }
        if let Some(timeout) = self.request_options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(whitelist) = self.whitelist {
            builder = builder.whitelist(whitelist);
        }
        if let Some(blacklist) = self.blacklist {
            builder = builder.blacklist(blacklist);
        }

        let builder = self
            .crawler_user_agents
            .iter()
            .fold(builder, |builder, ua| builder.crawler_user_agent(ua));
        self.extensions_to_ignore
            .iter()
            .fold(builder, |builder, ext| builder.extension_to_ignore(ext))
    }

    /// Validates the document and builds the configuration.
    ///
    /// # Errors
    ///
    /// See [`ConfigBuilder::build`].
    pub fn into_config(self) -> Result<Config, ConfigError> {
        self.into_builder().build()
    }
}
