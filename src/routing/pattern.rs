//! Path pattern parsing.
//!
//! # Responsibilities
//! - Parse a registration string (`/users/[id]/files/[[rest]]`) into segments
//! - Reject malformed patterns at registration time
//! - Split request paths the same way patterns are split
//!
//! # Design Decisions
//! - Parsed once, matched many times: no string inspection on the hot path
//! - Empty segments are dropped, so `/a//b/` and `a/b` are the same pattern
//! - A catch-all is only legal as the final segment

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single segment of a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches an identical path segment.
    Literal(String),
    /// `[name]`: matches exactly one path segment.
    Param(String),
    /// `[[name]]`: matches the remaining one-or-more path segments.
    CatchAll(String),
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, PatternError> {
        if let Some(inner) = raw.strip_prefix("[[") {
            let name = inner
                .strip_suffix("]]")
                .ok_or_else(|| PatternError::Unbalanced(raw.to_string()))?;
            return Self::named(name, raw).map(Segment::CatchAll);
        }

        if let Some(inner) = raw.strip_prefix('[') {
            let name = inner
                .strip_suffix(']')
                .ok_or_else(|| PatternError::Unbalanced(raw.to_string()))?;
            return Self::named(name, raw).map(Segment::Param);
        }

        if raw.contains('[') || raw.contains(']') {
            return Err(PatternError::Unbalanced(raw.to_string()));
        }

        Ok(Segment::Literal(raw.to_string()))
    }

    fn named(name: &str, raw: &str) -> Result<String, PatternError> {
        if name.is_empty() {
            return Err(PatternError::EmptyName(raw.to_string()));
        }
        if name.contains('[') || name.contains(']') {
            return Err(PatternError::Unbalanced(raw.to_string()));
        }
        Ok(name.to_string())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Param(name) => write!(f, "[{}]", name),
            Segment::CatchAll(name) => write!(f, "[[{}]]", name),
        }
    }
}

/// Errors produced while parsing a registration pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `[[name]]` segment appeared before the last position.
    #[error("catch-all segment `{0}` must be the last segment")]
    CatchAllNotLast(String),

    /// `[]` or `[[]]`.
    #[error("segment `{0}` has an empty parameter name")]
    EmptyName(String),

    /// Brackets that do not form `[name]` or `[[name]]`.
    #[error("segment `{0}` has unbalanced brackets")]
    Unbalanced(String),
}

/// A parsed, validated route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a `/`-delimited pattern.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let segments = split_path(pattern)
            .into_iter()
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let last = segments.len().saturating_sub(1);
        if let Some(seg) = segments[..last]
            .iter()
            .find(|s| matches!(s, Segment::CatchAll(_)))
        {
            return Err(PatternError::CatchAllNotLast(seg.to_string()));
        }

        Ok(Self { segments })
    }

    /// The parsed segments, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when the final segment is a catch-all.
    pub fn ends_with_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{}", seg)?;
        }
        Ok(())
    }
}

/// Split a request path (or a pattern) into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_pattern() {
        let pattern = PathPattern::parse("/users/[id]/files/[[rest]]").unwrap();
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Param("id".into()),
                Segment::Literal("files".into()),
                Segment::CatchAll("rest".into()),
            ]
        );
        assert!(pattern.ends_with_catch_all());
        assert_eq!(pattern.to_string(), "/users/[id]/files/[[rest]]");
    }

    #[test]
    fn test_root_pattern_is_empty() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.is_empty());
        assert_eq!(pattern.to_string(), "/");
    }

    #[test]
    fn test_empty_segments_ignored() {
        let a = PathPattern::parse("//v1///users/").unwrap();
        let b = PathPattern::parse("v1/users").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_catch_all_must_be_last() {
        let err = PathPattern::parse("/files/[[rest]]/meta").unwrap_err();
        assert_eq!(err, PatternError::CatchAllNotLast("[[rest]]".into()));
    }

    #[test]
    fn test_malformed_segments_rejected() {
        assert!(matches!(
            PathPattern::parse("/[]"),
            Err(PatternError::EmptyName(_))
        ));
        assert!(matches!(
            PathPattern::parse("/[[]]"),
            Err(PatternError::EmptyName(_))
        ));
        assert!(matches!(
            PathPattern::parse("/[id"),
            Err(PatternError::Unbalanced(_))
        ));
        assert!(matches!(
            PathPattern::parse("/id]"),
            Err(PatternError::Unbalanced(_))
        ));
        assert!(matches!(
            PathPattern::parse("/[[rest]"),
            Err(PatternError::Unbalanced(_))
        ));
    }

    #[test]
    fn test_split_path() {
        assert!(split_path("/").is_empty());
        assert_eq!(split_path("/v1/users/42"), vec!["v1", "users", "42"]);
        assert_eq!(split_path("v1//users/"), vec!["v1", "users"]);
    }
}
