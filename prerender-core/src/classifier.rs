//! Snapshot eligibility.
//!
//! The [`Classifier`] evaluates an ordered rule set against a
//! [`SnapshotRequest`]:
//!
//! 1. a request without a `User-Agent` is not eligible;
//! 2. only `GET` and `HEAD` are eligible;
//! 3. a request carrying [`X_PRERENDER`] already comes from the renderer and
//!    is not eligible;
//! 4. the request *wants* a snapshot if it has a non-empty
//!    `_escaped_fragment_` query parameter, a crawler user agent, or the
//!    [`X_BUFFERBOT`] header;
//! 5. static assets are never eligible, even for crawlers;
//! 6. with a whitelist, the URL must match one of its patterns;
//! 7. with a blacklist, neither the URL nor the referer may match;
//! 8. otherwise the outcome of step 4 decides.

use http::Method;
use tracing::debug;

use crate::pattern::PatternList;
use crate::request::SnapshotRequest;
use crate::rules::RuleCatalog;

/// Header set by the rendering service on its own page loads.
pub const X_PRERENDER: &str = "x-prerender";

/// Header sent by the Buffer link-preview bot.
pub const X_BUFFERBOT: &str = "x-bufferbot";

/// Query parameter of the AJAX crawling scheme.
pub const ESCAPED_FRAGMENT: &str = "_escaped_fragment_";

/// Rule that rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No user agent header.
    MissingUserAgent,
    /// Method other than `GET` or `HEAD`.
    Method,
    /// The request was issued by the rendering service itself.
    AlreadyRendering,
    /// The path ends with a static-asset extension.
    StaticAsset,
    /// A whitelist is configured and no pattern matched the URL.
    NotWhitelisted,
    /// A blacklist pattern matched the URL or the referer.
    Blacklisted,
    /// Nothing identified the client as a crawler.
    NotCrawler,
}

impl Rejection {
    /// Returns the rejection as a string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingUserAgent => "missing_user_agent",
            Rejection::Method => "method",
            Rejection::AlreadyRendering => "already_rendering",
            Rejection::StaticAsset => "static_asset",
            Rejection::NotWhitelisted => "not_whitelisted",
            Rejection::Blacklisted => "blacklisted",
            Rejection::NotCrawler => "not_crawler",
        }
    }
}

/// Outcome of [`Classifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The request should receive a snapshot.
    Eligible,
    /// The request goes to the application, for the given reason.
    Ineligible(Rejection),
}

impl Eligibility {
    /// Returns `true` for [`Eligibility::Eligible`].
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Decides whether a request should be answered with a snapshot.
///
/// # Examples
///
/// ```
/// use http::Request;
/// use prerender_core::{Classifier, PatternList, RuleCatalog, SnapshotRequest};
///
/// let classifier = Classifier::new(RuleCatalog::default())
///     .whitelist(Some(PatternList::new(["^/public/"]).unwrap()));
///
/// let request = Request::get("/public/x")
///     .header("user-agent", "Googlebot/2.1")
///     .body(())
///     .unwrap();
/// assert!(classifier.is_eligible(&SnapshotRequest::from_request(&request)));
///
/// let request = Request::get("/private/x")
///     .header("user-agent", "Googlebot/2.1")
///     .body(())
///     .unwrap();
/// assert!(!classifier.is_eligible(&SnapshotRequest::from_request(&request)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: RuleCatalog,
    whitelist: Option<PatternList>,
    blacklist: Option<PatternList>,
}

impl Classifier {
    /// Creates a classifier without whitelist or blacklist.
    pub fn new(rules: RuleCatalog) -> Self {
        Self {
            rules,
            whitelist: None,
            blacklist: None,
        }
    }

    /// Sets the whitelist. `Some` of an empty list rejects everything.
    pub fn whitelist(self, whitelist: Option<PatternList>) -> Self {
        Self { whitelist, ..self }
    }

    /// Sets the blacklist.
    pub fn blacklist(self, blacklist: Option<PatternList>) -> Self {
        Self { blacklist, ..self }
    }

    /// Rule catalog in use.
    pub fn rules(&self) -> &RuleCatalog {
        &self.rules
    }

    /// Configured whitelist.
    pub fn whitelist_patterns(&self) -> Option<&PatternList> {
        self.whitelist.as_ref()
    }

    /// Configured blacklist.
    pub fn blacklist_patterns(&self) -> Option<&PatternList> {
        self.blacklist.as_ref()
    }

    /// Returns `true` if the request should receive a snapshot.
    pub fn is_eligible(&self, request: &SnapshotRequest) -> bool {
        self.classify(request).is_eligible()
    }

    /// Evaluates every rule in order and reports which one decided.
    pub fn classify(&self, request: &SnapshotRequest) -> Eligibility {
        let eligibility = self.evaluate(request);
        if let Eligibility::Ineligible(rejection) = eligibility {
            debug!(
                url = request.url(),
                method = %request.method(),
                reason = rejection.as_str(),
                "Request not eligible for snapshot"
            );
        }
        eligibility
    }

    fn evaluate(&self, request: &SnapshotRequest) -> Eligibility {
        use Eligibility::{Eligible, Ineligible};

        let user_agent = match request.user_agent() {
            Some(user_agent) if !user_agent.is_empty() => user_agent,
            _ => return Ineligible(Rejection::MissingUserAgent),
        };

        if request.method() != Method::GET && request.method() != Method::HEAD {
            return Ineligible(Rejection::Method);
        }

        if request.has_header(X_PRERENDER) {
            return Ineligible(Rejection::AlreadyRendering);
        }

        // Every signal is evaluated; none of them short-circuits the rest.
        let escaped_fragment = request
            .query_param(ESCAPED_FRAGMENT)
            .is_some_and(|fragment| !fragment.is_empty());
        let crawler = self.rules.is_crawler(&user_agent);
        let bufferbot = request.has_header(X_BUFFERBOT);
        let wants_snapshot = escaped_fragment || crawler || bufferbot;

        if self.rules.is_static_asset(request.path()) {
            return Ineligible(Rejection::StaticAsset);
        }

        let url = request.url();

        if let Some(whitelist) = &self.whitelist
            && !whitelist.matches_any(url)
        {
            return Ineligible(Rejection::NotWhitelisted);
        }

        if let Some(blacklist) = &self.blacklist {
            let referer_matches = request
                .referer()
                .is_some_and(|referer| blacklist.matches_any(&referer));
            if blacklist.matches_any(url) || referer_matches {
                return Ineligible(Rejection::Blacklisted);
            }
        }

        if wants_snapshot {
            Eligible
        } else {
            Ineligible(Rejection::NotCrawler)
        }
    }
}
