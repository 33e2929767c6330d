//! Property paths for nested reads
//!
//! Provides [`PropertyPath`] for addressing a value several properties deep
//! inside a guarded graph.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path of property keys from a root object
///
/// # Examples
/// - `["foo", "bing", "boom"]` → `foo.bing.boom`
/// - `["list", "0"]` → `list.0`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Empty path (the root itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the root path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent path (if not root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, init)| Self(init.to_vec()))
    }

    /// Last segment (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment {
                        input: s.to_string(),
                    })
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<String>> for PropertyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for PropertyPath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(ToString::to_string).collect())
    }
}

/// Errors parsing property paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{input}' contains an empty segment")]
    EmptySegment {
        /// Text being parsed
        input: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotted() {
        let path: PropertyPath = "foo.bing.boom".parse().unwrap();
        assert_eq!(path.segments(), &["foo", "bing", "boom"]);
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "foo.bing.boom");
    }

    #[test]
    fn new_matches_parsed() {
        let path = PropertyPath::new(vec!["foo".to_string(), "bar".to_string()]);
        assert_eq!(path, "foo.bar".parse::<PropertyPath>().unwrap());
        assert_eq!(path.iter().collect::<Vec<_>>(), vec!["foo", "bar"]);
    }

    #[test]
    fn empty_text_is_root() {
        let path: PropertyPath = "".parse().unwrap();
        assert!(path.is_empty());
        assert_eq!(path, PropertyPath::root());
    }

    #[test]
    fn empty_segment_rejected() {
        assert!(matches!(
            "foo..bar".parse::<PropertyPath>(),
            Err(PathError::EmptySegment { .. })
        ));
        assert!("foo.".parse::<PropertyPath>().is_err());
    }

    #[test]
    fn keys_need_not_be_identifiers() {
        let path: PropertyPath = "list.0.some-key".parse().unwrap();
        assert_eq!(path.last(), Some("some-key"));
    }

    #[test]
    fn parent_and_child() {
        let path = PropertyPath::from(&["a", "b"][..]);
        assert_eq!(path.child("c").to_string(), "a.b.c");
        assert_eq!(path.parent().unwrap().to_string(), "a");
        assert!(PropertyPath::root().parent().is_none());
    }
}
