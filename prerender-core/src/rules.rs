//! Static crawler and asset rules.
//!
//! The [`RuleCatalog`] bundles the two lists the classifier consults: user
//! agent substrings that identify crawlers and link-preview bots, and path
//! suffixes of static assets that never get a snapshot.

/// User agent substrings of known crawlers and link-preview bots.
///
/// Matching is case-insensitive: both sides are lower-cased before the
/// substring check.
pub const CRAWLER_USER_AGENTS: &[&str] = &[
    "googlebot",
    "Yahoo! Slurp",
    "bingbot",
    "yandex",
    "baiduspider",
    "facebookexternalhit",
    "twitterbot",
    "rogerbot",
    "linkedinbot",
    "embedly",
    "quora link preview",
    "showyoubot",
    "outbrain",
    "pinterest/0.",
    "developers.google.com/+/web/snippet",
    "slackbot",
    "vkShare",
    "W3C_Validator",
    "redditbot",
    "Applebot",
    "WhatsApp",
    "flipboard",
    "tumblr",
    "bitlybot",
    "SkypeUriPreview",
    "nuzzel",
    "Discordbot",
    "Google Page Speed",
    "Qwantify",
    "pinterestbot",
    "Bitrix link preview",
    "XING-contenttabreceiver",
    "Chrome-Lighthouse",
    "TelegramBot",
    "SeznamBot",
    "screaming frog SEO spider",
    "AhrefsBot",
    "YisouSpider",
];

/// Path suffixes of static assets.
pub const EXTENSIONS_TO_IGNORE: &[&str] = &[
    ".js",
    ".css",
    ".xml",
    ".less",
    ".png",
    ".jpg",
    ".jpeg",
    ".gif",
    ".pdf",
    ".doc",
    ".txt",
    ".ico",
    ".rss",
    ".zip",
    ".mp3",
    ".rar",
    ".exe",
    ".wmv",
    ".avi",
    ".ppt",
    ".mpg",
    ".mpeg",
    ".tif",
    ".wav",
    ".mov",
    ".psd",
    ".ai",
    ".xls",
    ".mp4",
    ".m4a",
    ".swf",
    ".dat",
    ".dmg",
    ".iso",
    ".flv",
    ".m4v",
    ".torrent",
    ".woff",
    ".woff2",
    ".ttf",
    ".svg",
    ".webmanifest",
];

/// Crawler user agents and static-asset extensions used by the classifier.
///
/// Entries are stored lower-cased so matching never has to re-normalize them.
///
/// # Examples
///
/// ```
/// use prerender_core::RuleCatalog;
///
/// let rules = RuleCatalog::default()
///     .crawler_user_agent("MyCompanyBot")
///     .extension_to_ignore(".wasm");
///
/// assert!(rules.is_crawler("Mozilla/5.0 (compatible; mycompanybot/1.0)"));
/// assert!(rules.is_static_asset("/pkg/app.WASM"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCatalog {
    crawler_user_agents: Vec<String>,
    extensions_to_ignore: Vec<String>,
}

impl RuleCatalog {
    /// Creates an empty catalog that matches no crawler and no asset.
    pub fn empty() -> Self {
        Self {
            crawler_user_agents: Vec::new(),
            extensions_to_ignore: Vec::new(),
        }
    }

    /// Adds a crawler user agent substring.
    pub fn crawler_user_agent(mut self, user_agent: impl AsRef<str>) -> Self {
        self.crawler_user_agents
            .push(user_agent.as_ref().to_lowercase());
        self
    }

    /// Adds a static-asset suffix, for example `".wasm"`.
    pub fn extension_to_ignore(mut self, extension: impl AsRef<str>) -> Self {
        self.extensions_to_ignore
            .push(extension.as_ref().to_lowercase());
        self
    }

    /// Returns the crawler user agent substrings.
    pub fn crawler_user_agents(&self) -> &[String] {
        &self.crawler_user_agents
    }

    /// Returns the static-asset suffixes.
    pub fn extensions_to_ignore(&self) -> &[String] {
        &self.extensions_to_ignore
    }

    /// Returns `true` if the user agent contains any crawler substring.
    pub fn is_crawler(&self, user_agent: &str) -> bool {
        let user_agent = user_agent.to_lowercase();
        self.crawler_user_agents
            .iter()
            .any(|crawler| user_agent.contains(crawler.as_str()))
    }

    /// Returns `true` if the lower-cased path ends with an ignored suffix.
    pub fn is_static_asset(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.extensions_to_ignore
            .iter()
            .any(|extension| path.ends_with(extension.as_str()))
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        let catalog = CRAWLER_USER_AGENTS
            .iter()
            .fold(Self::empty(), |catalog, ua| catalog.crawler_user_agent(ua));
        EXTENSIONS_TO_IGNORE
            .iter()
            .fold(catalog, |catalog, ext| catalog.extension_to_ignore(ext))
    }
}
