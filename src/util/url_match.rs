use regex::Regex;

/// A URL matching rule: either an exact string comparison against the full
/// request URL or a regular expression applied to it.
#[derive(Clone, Debug)]
pub enum UrlRule {
    Exact(String),
    Pattern(Regex),
}

impl UrlRule {
    pub fn exact(url: impl Into<String>) -> Self {
        UrlRule::Exact(url.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(UrlRule::Pattern(Regex::new(pattern)?))
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlRule::Exact(exact) => exact == url,
            UrlRule::Pattern(regex) => regex.is_match(url),
        }
    }
}

impl From<&str> for UrlRule {
    fn from(url: &str) -> Self {
        UrlRule::exact(url)
    }
}

/// Returns true when `url` matches at least one rule. An empty rule list
/// matches nothing.
pub fn matches_any(rules: &[UrlRule], url: &str) -> bool {
    rules.iter().any(|rule| rule.matches(url))
}
