//! Ordered lists of URL patterns.

use regex::Regex;

/// Ordered list of compiled regular expressions.
///
/// Patterns are raw, unanchored regex sources. They are compiled once when
/// the list is built; matching is [`Regex::is_match`] against the whole
/// subject string.
///
/// An empty list is a valid, configured list. Used as a whitelist it rejects
/// every request because no pattern can match.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    /// Compiles every pattern in order.
    ///
    /// # Errors
    ///
    /// Returns the pattern source together with the [`regex::Error`] of the
    /// first pattern that fails to compile.
    pub fn new<I, S>(patterns: I) -> Result<Self, (String, regex::Error)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|error| (pattern.to_owned(), error))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|patterns| Self { patterns })
    }

    /// Wraps already compiled expressions.
    ///
    /// Useful for patterns built with [`regex::RegexBuilder`] options that
    /// plain sources cannot express.
    pub fn from_regexes(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    /// Returns `true` if any pattern matches `subject`.
    pub fn matches_any(&self, subject: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(subject))
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if the list holds no pattern.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterates over pattern sources.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}
