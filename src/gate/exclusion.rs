use crate::error::{EdgeError, Result};
use regex::RegexSet;

/// Paths the auth gate never inspects (API routes, build assets, files)
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    patterns: RegexSet,
}

impl ExclusionMatcher {
    /// Compile exclusion patterns; any invalid expression is an error
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns =
            RegexSet::new(patterns).map_err(|e| EdgeError::InvalidPattern(e.to_string()))?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.is_match(path)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateConfig;

    fn default_matcher() -> ExclusionMatcher {
        ExclusionMatcher::new(&GateConfig::default().exclude).unwrap()
    }

    #[test]
    fn test_default_exclusions() {
        let matcher = default_matcher();
        assert!(matcher.is_excluded("/api"));
        assert!(matcher.is_excluded("/api/assets/upload"));
        assert!(matcher.is_excluded("/_next/static/chunks/main.js"));
        assert!(matcher.is_excluded("/_next/image"));
        assert!(matcher.is_excluded("/favicon.ico"));
        assert!(matcher.is_excluded("/images/logo.png"));
        assert!(matcher.is_excluded("/robots.txt"));
    }

    #[test]
    fn test_pages_not_excluded() {
        let matcher = default_matcher();
        assert!(!matcher.is_excluded("/"));
        assert!(!matcher.is_excluded("/login"));
        assert!(!matcher.is_excluded("/calendar"));
        assert!(!matcher.is_excluded("/settings/profile"));
        assert!(!matcher.is_excluded("/apiary"));
        assert!(!matcher.is_excluded("/v1.2/dashboard"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(ExclusionMatcher::new(["^/ok$", "(broken"]).is_err());
    }

    #[test]
    fn test_empty_matcher_excludes_nothing() {
        let matcher = ExclusionMatcher::new(Vec::<String>::new()).unwrap();
        assert!(matcher.is_empty());
        assert!(!matcher.is_excluded("/api/health"));
    }
}
