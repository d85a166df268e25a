//! Public resource locators.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Locator parsing and derivation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocatorError {
    #[error("locator is empty")]
    Empty,

    #[error("invalid locator {input:?}: {reason}")]
    Parse { input: String, reason: String },

    #[error("unsupported scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("locator {0} has no host")]
    MissingHost(String),

    #[error("invalid path segment {0:?}")]
    InvalidSegment(String),
}

/// An absolute http(s) URL addressing one unit of public content.
///
/// Immutable once built; child locators are new values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceLocator(Url);

impl ResourceLocator {
    /// Parse an absolute locator
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(LocatorError::Empty);
        }
        let url = Url::parse(trimmed).map_err(|e| LocatorError::Parse {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(url)
    }

    /// Parse `input` relative to `base` when it is not already absolute.
    ///
    /// `base` is treated as a directory: `https://host/prefix` and
    /// `https://host/prefix/` both resolve `vat` to `https://host/prefix/vat`.
    /// Inputs starting with `/` still resolve from the host root.
    pub fn parse_with_base(input: &str, base: Option<&ResourceLocator>) -> Result<Self, LocatorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(LocatorError::Empty);
        }
        match (Url::parse(trimmed), base) {
            (Ok(url), _) => Self::from_url(url),
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => {
                let mut dir = base.0.clone();
                if !dir.path().ends_with('/') {
                    let path = format!("{}/", dir.path());
                    dir.set_path(&path);
                }
                let url = dir.join(trimmed).map_err(|e| LocatorError::Parse {
                    input: trimmed.to_string(),
                    reason: e.to_string(),
                })?;
                Self::from_url(url)
            }
            (Err(e), _) => Err(LocatorError::Parse {
                input: trimmed.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Wrap an already-parsed URL
    pub fn from_url(url: Url) -> Result<Self, LocatorError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(LocatorError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(LocatorError::MissingHost(url.to_string()));
        }
        Ok(Self(url))
    }

    /// Derive the locator of a child page: `<self>/<segment>`.
    ///
    /// A trailing slash on the parent is not doubled and any query string
    /// is kept on the child.
    pub fn child(&self, segment: &str) -> Result<Self, LocatorError> {
        if segment.is_empty() || segment.contains('/') || segment == "." || segment == ".." {
            return Err(LocatorError::InvalidSegment(segment.to_string()));
        }
        let mut url = self.0.clone();
        url.path_segments_mut()
            .map_err(|()| LocatorError::InvalidSegment(segment.to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(Self(url))
    }

    /// Borrow the underlying URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The locator as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Last non-empty path segment, if any
    pub fn last_segment(&self) -> Option<&str> {
        self.0
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for ResourceLocator {
    type Error = LocatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceLocator> for String {
    fn from(locator: ResourceLocator) -> Self {
        locator.0.into()
    }
}

impl std::str::FromStr for ResourceLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let loc = ResourceLocator::parse("https://www.example.org/vat-rates").unwrap();
        assert_eq!(loc.as_str(), "https://www.example.org/vat-rates");
        assert_eq!(loc.last_segment(), Some("vat-rates"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ResourceLocator::parse("  "), Err(LocatorError::Empty));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let err = ResourceLocator::parse("ftp://example.org/file").unwrap_err();
        assert_eq!(err, LocatorError::UnsupportedScheme("ftp".to_string()));
    }

    #[test]
    fn test_parse_rejects_relative_without_base() {
        assert!(matches!(
            ResourceLocator::parse("/vat-rates"),
            Err(LocatorError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_with_base() {
        let base = ResourceLocator::parse("https://www.example.org").unwrap();
        let loc = ResourceLocator::parse_with_base("/vat-rates", Some(&base)).unwrap();
        assert_eq!(loc.as_str(), "https://www.example.org/vat-rates");

        let abs = ResourceLocator::parse_with_base("http://other.test/x", Some(&base)).unwrap();
        assert_eq!(abs.as_str(), "http://other.test/x");
    }

    #[test]
    fn test_base_without_trailing_slash_keeps_prefix() {
        let base = ResourceLocator::parse("https://www.example.org/prefix").unwrap();
        let loc = ResourceLocator::parse_with_base("vat", Some(&base)).unwrap();
        assert_eq!(loc.as_str(), "https://www.example.org/prefix/vat");

        let base = ResourceLocator::parse("https://www.example.org/prefix/").unwrap();
        let loc = ResourceLocator::parse_with_base("vat", Some(&base)).unwrap();
        assert_eq!(loc.as_str(), "https://www.example.org/prefix/vat");
    }

    #[test]
    fn test_child_appends_segment() {
        let parent = ResourceLocator::parse("https://www.example.org/guide-123").unwrap();
        let child = parent.child("part-two").unwrap();
        assert_eq!(child.as_str(), "https://www.example.org/guide-123/part-two");
    }

    #[test]
    fn test_child_does_not_double_trailing_slash() {
        let parent = ResourceLocator::parse("https://www.example.org/guide-123/").unwrap();
        let child = parent.child("part-two").unwrap();
        assert_eq!(child.as_str(), "https://www.example.org/guide-123/part-two");
    }

    #[test]
    fn test_child_keeps_query() {
        let parent = ResourceLocator::parse("https://www.example.org/guide?cache=bust").unwrap();
        let child = parent.child("part").unwrap();
        assert_eq!(child.as_str(), "https://www.example.org/guide/part?cache=bust");
    }

    #[test]
    fn test_child_rejects_bad_segments() {
        let parent = ResourceLocator::parse("https://www.example.org/guide").unwrap();
        assert!(parent.child("").is_err());
        assert!(parent.child("a/b").is_err());
        assert!(parent.child("..").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let loc = ResourceLocator::parse("https://www.example.org/a").unwrap();
        let json = serde_json::to_string(&loc).unwrap();
        assert_eq!(json, "\"https://www.example.org/a\"");

        let back: ResourceLocator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, loc);

        let bad: Result<ResourceLocator, _> = serde_json::from_str("\"mailto:x@y\"");
        assert!(bad.is_err());
    }
}
