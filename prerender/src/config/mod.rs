//! Process-wide configuration.
//!
//! A [`Config`] is assembled once at startup, either with
//! [`Config::builder()`] or from a YAML document through [`ConfigFile`], and
//! then shared read-only by every request.

mod file;

use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use prerender_core::{Classifier, PatternList, RuleCatalog};

use crate::error::ConfigError;

pub use file::{ConfigFile, Patterns, RequestOptionsFile};

/// Default rendering service.
pub const DEFAULT_SERVICE_URL: &str = "https://service.prerender.io/";

/// Scheme used when rebuilding the public URL of a request.
pub const DEFAULT_SCHEME: &str = "https";

/// Environment variable overriding the rendering service URL.
pub const ENV_SERVICE_URL: &str = "PRERENDER_SERVICE_URL";

/// Environment variable holding the rendering service token.
pub const ENV_TOKEN: &str = "PRERENDER_TOKEN";

/// Extra options merged into every call to the rendering service.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers sent with every call. Forwarded and fixed headers win on
    /// conflict.
    pub headers: HeaderMap,
    /// Per-call timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

/// Immutable snapshot-serving configuration.
#[derive(Debug, Clone)]
pub struct Config {
    service_url: String,
    scheme: String,
    forward_headers: bool,
    token: Option<HeaderValue>,
    request_options: RequestOptions,
    classifier: Classifier,
}

impl Config {
    /// Creates a builder with default values.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Rendering service base URL, always ending with a single `/`.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Scheme of the public URL handed to the rendering service.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Whether incoming headers are forwarded to the rendering service.
    pub fn forward_headers(&self) -> bool {
        self.forward_headers
    }

    /// Rendering service token, if any.
    pub fn token(&self) -> Option<&HeaderValue> {
        self.token.as_ref()
    }

    /// Extra options for rendering service calls.
    pub fn request_options(&self) -> &RequestOptions {
        &self.request_options
    }

    /// Classifier built from the rule catalog and pattern lists.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_owned(),
            scheme: DEFAULT_SCHEME.to_owned(),
            forward_headers: false,
            token: None,
            request_options: RequestOptions::default(),
            classifier: Classifier::new(RuleCatalog::default()),
        }
    }
}

/// Builder for [`Config`].
///
/// Values are validated in [`build`](ConfigBuilder::build): header names and
/// values, the service URL, and every whitelist and blacklist pattern.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use prerender::Config;
///
/// let config = Config::builder()
///     .service_url("http://localhost:3000")
///     .token("secret")
///     .forward_headers(true)
///     .request_header("x-render-priority", "low")
///     .timeout(Duration::from_secs(20))
///     .whitelist(["^/products/", "^/blog/"])
///     .blacklist("^/products/internal")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.service_url(), "http://localhost:3000/");
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    service_url: String,
    scheme: String,
    forward_headers: bool,
    token: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    whitelist: Option<Vec<String>>,
    blacklist: Option<Vec<String>>,
    rules: RuleCatalog,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_owned(),
            scheme: DEFAULT_SCHEME.to_owned(),
            forward_headers: false,
            token: None,
            headers: Vec::new(),
            timeout: None,
            whitelist: None,
            blacklist: None,
            rules: RuleCatalog::default(),
        }
    }
}

impl ConfigBuilder {
    /// Sets the rendering service base URL.
    pub fn service_url(self, service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            ..self
        }
    }

    /// Sets the scheme of the public URL handed to the rendering service.
    pub fn scheme(self, scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            ..self
        }
    }

    /// Forwards incoming headers (except `Host`) to the rendering service.
    pub fn forward_headers(self, forward_headers: bool) -> Self {
        Self {
            forward_headers,
            ..self
        }
    }

    /// Sets the rendering service token. An empty token disables it.
    pub fn token(self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self
        }
    }

    /// Adds a header sent with every rendering service call.
    pub fn request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a timeout for rendering service calls.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Only URLs matching one of these patterns are eligible.
    ///
    /// Accepts a single pattern or any list of patterns. An empty list
    /// makes every request ineligible.
    pub fn whitelist(self, patterns: impl Into<Patterns>) -> Self {
        Self {
            whitelist: Some(patterns.into().into_vec()),
            ..self
        }
    }

    /// URLs or referers matching any of these patterns are not eligible.
    pub fn blacklist(self, patterns: impl Into<Patterns>) -> Self {
        Self {
            blacklist: Some(patterns.into().into_vec()),
            ..self
        }
    }

    /// Replaces the rule catalog.
    pub fn rules(self, rules: RuleCatalog) -> Self {
        Self { rules, ..self }
    }

    /// Adds a crawler user agent substring to the catalog.
    pub fn crawler_user_agent(self, user_agent: impl AsRef<str>) -> Self {
        Self {
            rules: self.rules.crawler_user_agent(user_agent),
            ..self
        }
    }

    /// Adds a static-asset suffix to the catalog.
    pub fn extension_to_ignore(self, extension: impl AsRef<str>) -> Self {
        Self {
            rules: self.rules.extension_to_ignore(extension),
            ..self
        }
    }

    /// Applies [`ENV_SERVICE_URL`] and [`ENV_TOKEN`] from the process
    /// environment.
    pub fn with_env(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Applies [`ENV_SERVICE_URL`] and [`ENV_TOKEN`] using `lookup`.
    pub fn with_env_lookup<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let builder = match lookup(ENV_SERVICE_URL) {
            Some(url) => self.service_url(url),
            None => self,
        };
        match lookup(ENV_TOKEN) {
            Some(token) => builder.token(token),
            None => builder,
        }
    }

    /// Validates the settings and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unparsable service URL, an invalid
    /// scheme, header or token, or a pattern that is not a valid regex.
    pub fn build(self) -> Result<Config, ConfigError> {
        let service_url = normalize_service_url(&self.service_url)?;

        if !is_valid_scheme(&self.scheme) {
            return Err(ConfigError::InvalidScheme(self.scheme));
        }

        let token = self
            .token
            .filter(|token| !token.is_empty())
            .map(|token| {
                HeaderValue::from_str(&token)
                    .map_err(|e| ConfigError::InvalidHeaderValue("x-prerender-token".to_owned(), e))
            })
            .transpose()?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name: HeaderName = name
                .parse()
                .map_err(|e| ConfigError::InvalidHeaderName(name.clone(), e))?;
            let header_value: HeaderValue = value
                .parse()
                .map_err(|e| ConfigError::InvalidHeaderValue(name.clone(), e))?;
            headers.insert(header_name, header_value);
        }

        let classifier = Classifier::new(self.rules)
            .whitelist(compile(self.whitelist)?)
            .blacklist(compile(self.blacklist)?);

        Ok(Config {
            service_url,
            scheme: self.scheme,
            forward_headers: self.forward_headers,
            token,
            request_options: RequestOptions {
                headers,
                timeout: self.timeout,
            },
            classifier,
        })
    }
}

fn compile(patterns: Option<Vec<String>>) -> Result<Option<PatternList>, ConfigError> {
    patterns
        .map(|patterns| {
            PatternList::new(patterns)
                .map_err(|(pattern, error)| ConfigError::InvalidRegex { pattern, error })
        })
        .transpose()
}

fn normalize_service_url(service_url: &str) -> Result<String, ConfigError> {
    url::Url::parse(service_url).map_err(|error| ConfigError::InvalidServiceUrl {
        url: service_url.to_owned(),
        error,
    })?;
    Ok(format!("{}/", service_url.trim_end_matches('/')))
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_url_gets_single_trailing_slash() {
        for (input, expected) in [
            ("http://svc", "http://svc/"),
            ("http://svc/", "http://svc/"),
            ("http://svc//", "http://svc/"),
            ("http://svc/render", "http://svc/render/"),
        ] {
            let config = Config::builder().service_url(input).build().unwrap();
            assert_eq!(config.service_url(), expected);
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.service_url(), DEFAULT_SERVICE_URL);
        assert_eq!(config.scheme(), "https");
        assert!(!config.forward_headers());
        assert!(config.token().is_none());
        assert!(config.classifier().whitelist_patterns().is_none());
        assert!(config.classifier().blacklist_patterns().is_none());
    }

    #[test]
    fn test_empty_token_is_disabled() {
        let config = Config::builder().token("").build().unwrap();
        assert!(config.token().is_none());

        let config = Config::builder().token("abc").build().unwrap();
        assert_eq!(config.token().unwrap(), "abc");
    }

    #[test]
    fn test_invalid_pattern_fails_at_build() {
        let err = Config::builder().blacklist(["ok", "(broken"]).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegex { ref pattern, .. } if pattern == "(broken"));
    }

    #[test]
    fn test_single_pattern_is_a_list() {
        let config = Config::builder().whitelist("^/public/").build().unwrap();
        let whitelist = config.classifier().whitelist_patterns().unwrap();
        assert_eq!(whitelist.len(), 1);
    }

    #[test]
    fn test_empty_whitelist_is_kept() {
        let config = Config::builder()
            .whitelist(Vec::<String>::new())
            .build()
            .unwrap();
        assert!(config.classifier().whitelist_patterns().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_header_and_url() {
        assert!(matches!(
            Config::builder().request_header("bad header", "v").build(),
            Err(ConfigError::InvalidHeaderName(..))
        ));
        assert!(matches!(
            Config::builder().request_header("x-ok", "line\nbreak").build(),
            Err(ConfigError::InvalidHeaderValue(..))
        ));
        assert!(matches!(
            Config::builder().service_url("not a url").build(),
            Err(ConfigError::InvalidServiceUrl { .. })
        ));
        assert!(matches!(
            Config::builder().scheme("ht tp").build(),
            Err(ConfigError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::builder()
            .service_url("http://ignored")
            .with_env_lookup(|key| match key {
                ENV_SERVICE_URL => Some("http://render.internal:3000".to_owned()),
                ENV_TOKEN => Some("from-env".to_owned()),
                _ => None,
            })
            .build()
            .unwrap();
        assert_eq!(config.service_url(), "http://render.internal:3000/");
        assert_eq!(config.token().unwrap(), "from-env");

        let config = Config::builder()
            .service_url("http://kept")
            .with_env_lookup(|_| None)
            .build()
            .unwrap();
        assert_eq!(config.service_url(), "http://kept/");
    }

    #[test]
    fn test_extra_rules_are_appended() {
        let config = Config::builder()
            .crawler_user_agent("AcmeBot")
            .extension_to_ignore(".wasm")
            .build()
            .unwrap();
        let rules = config.classifier().rules();
        assert!(rules.is_crawler("acmebot/1.0"));
        assert!(rules.is_crawler("Googlebot"));
        assert!(rules.is_static_asset("/pkg/app.wasm"));
    }
}
