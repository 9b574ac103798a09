//! Route pattern parsing.
//!
//! This module provides [`RoutePattern`], the parsed form of a route string
//! such as `table/book/:id` or `files/*`. Parsing happens once, at
//! registration time; matching is done by
//! [`RouteMatcher`](super::matcher::RouteMatcher).
//!
//! ## Grammar
//!
//! A pattern is a `/`-separated list of segments. One leading and one
//! trailing `/` are ignored.
//!
//! | Segment          | Meaning                                                  |
//! |------------------|----------------------------------------------------------|
//! | `book`           | Literal, matched verbatim (case-sensitive)               |
//! | `:id`            | Parameter, matches one path component                    |
//! | `:id([0-9]+)`    | Parameter whose component must fully match the regex     |
//! | `*`              | Wildcard, matches the rest of the path; last segment only |
//!
//! Parentheses are only significant in parameter segments: a `/` inside a
//! constraint does not split, and a literal may contain `(` or `)` freely.
//! A parameter name is any non-empty text up to the constraint. Literals are
//! written unencoded (`menu/café`) and compared with the percent-encoded path.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use deeplink_core::{DeepLinkError, DeepLinkResult};

/// The sigil that introduces a parameter segment.
pub const PARAMETER_SIGIL: char = ':';

/// The segment text that denotes a wildcard.
pub const WILDCARD_SIGIL: &str = "*";

/// One typed segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text matched verbatim.
    Literal(String),
    /// A named capture of one path component, optionally constrained by a regex.
    Parameter {
        /// The parameter name, unique within the pattern.
        name: String,
        /// An inline regex the captured component must fully match.
        constraint: Option<String>,
    },
    /// The remainder of the path, separators included.
    Wildcard,
}

impl Segment {
    /// Returns the parameter name if this is a parameter segment.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::Parameter { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.write_str(text),
            Self::Parameter {
                name,
                constraint: None,
            } => write!(f, "{PARAMETER_SIGIL}{name}"),
            Self::Parameter {
                name,
                constraint: Some(constraint),
            } => write!(f, "{PARAMETER_SIGIL}{name}({constraint})"),
            Self::Wildcard => f.write_str(WILDCARD_SIGIL),
        }
    }
}

/// A parsed, validated route pattern.
///
/// Immutable once built. Parameter names are unique and a wildcard, if
/// present, is the last segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parses a route pattern string.
    ///
    /// # Examples
    ///
    /// ```
    /// use deeplink_routing::routes::pattern::{RoutePattern, Segment};
    ///
    /// let pattern = RoutePattern::parse("table/book/:id").unwrap();
    /// assert_eq!(pattern.segments().len(), 3);
    /// assert_eq!(pattern.segments()[2].parameter_name(), Some("id"));
    ///
    /// assert!(RoutePattern::parse("a/*/b").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::InvalidPattern`] if the pattern is empty, has
    /// an empty segment, a wildcard that is not last, a duplicated or empty
    /// parameter name, unbalanced parentheses, or an invalid constraint.
    pub fn parse(raw: &str) -> DeepLinkResult<Self> {
        let mut segments = Vec::new();
        let mut seen = HashSet::new();

        let parts = split_segments(raw)?;
        let count = parts.len();

        for (position, part) in parts.into_iter().enumerate() {
            let segment = classify(raw, part)?;
            match &segment {
                Segment::Wildcard if position + 1 != count => {
                    return Err(DeepLinkError::invalid_pattern(
                        raw,
                        "wildcard must be the last segment",
                    ));
                }
                Segment::Parameter { name, .. } if !seen.insert(name.clone()) => {
                    return Err(DeepLinkError::invalid_pattern(
                        raw,
                        format!("duplicate parameter name '{name}'"),
                    ));
                }
                _ => {}
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Returns the original pattern string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments, in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the declared parameter names, in order.
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::parameter_name)
    }

    /// Returns `true` if the pattern ends with a wildcard.
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses a route pattern string. Shorthand for [`RoutePattern::parse`].
///
/// # Errors
///
/// See [`RoutePattern::parse`].
pub fn compile(raw: &str) -> DeepLinkResult<RoutePattern> {
    RoutePattern::parse(raw)
}

/// Splits the pattern on `/`, except inside the constraint of a parameter segment.
fn split_segments(raw: &str) -> DeepLinkResult<Vec<&str>> {
    let body = raw.strip_prefix('/').unwrap_or(raw);
    let body = body.strip_suffix('/').unwrap_or(body);

    if body.is_empty() {
        return Err(DeepLinkError::invalid_pattern(raw, "pattern is empty"));
    }

    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;
    let mut in_parameter = body.starts_with(PARAMETER_SIGIL);

    for (idx, ch) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if depth > 0 => escaped = true,
            '(' if in_parameter => depth += 1,
            ')' if in_parameter => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    DeepLinkError::invalid_pattern(raw, "unbalanced parentheses")
                })?;
            }
            '/' if depth == 0 => {
                parts.push(&body[start..idx]);
                start = idx + 1;
                in_parameter = body[start..].starts_with(PARAMETER_SIGIL);
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(DeepLinkError::invalid_pattern(raw, "unbalanced parentheses"));
    }
    parts.push(&body[start..]);

    if parts.iter().any(|part| part.is_empty()) {
        return Err(DeepLinkError::invalid_pattern(raw, "empty segment"));
    }
    Ok(parts)
}

fn classify(raw: &str, part: &str) -> DeepLinkResult<Segment> {
    if part == WILDCARD_SIGIL {
        return Ok(Segment::Wildcard);
    }

    let Some(spec) = part.strip_prefix(PARAMETER_SIGIL) else {
        return Ok(Segment::Literal(part.to_string()));
    };

    let (name, constraint) = match spec.find('(') {
        Some(open) => {
            let inner = spec[open + 1..].strip_suffix(')').ok_or_else(|| {
                DeepLinkError::invalid_pattern(
                    raw,
                    format!("constraint of '{part}' must end the segment"),
                )
            })?;
            (&spec[..open], Some(inner))
        }
        None => (spec, None),
    };

    if name.is_empty() || name.contains(')') {
        return Err(DeepLinkError::invalid_pattern(
            raw,
            format!("invalid parameter name in '{part}'"),
        ));
    }

    if let Some(constraint) = constraint {
        if constraint.is_empty() {
            return Err(DeepLinkError::invalid_pattern(
                raw,
                format!("empty constraint for parameter '{name}'"),
            ));
        }
        Regex::new(constraint).map_err(|e| {
            DeepLinkError::invalid_pattern(raw, format!("invalid constraint for '{name}': {e}"))
        })?;
    }

    Ok(Segment::Parameter {
        name: name.to_string(),
        constraint: constraint.map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(text: &str) -> Segment {
        Segment::Literal(text.to_string())
    }

    fn param(name: &str) -> Segment {
        Segment::Parameter {
            name: name.to_string(),
            constraint: None,
        }
    }

    #[test]
    fn test_parse_literals_and_parameter() {
        let p = RoutePattern::parse("table/book/:id").unwrap();
        assert_eq!(p.segments(), &[literal("table"), literal("book"), param("id")]);
        assert_eq!(p.raw(), "table/book/:id");
        assert!(!p.has_wildcard());
    }

    #[test]
    fn test_parse_ignores_one_leading_and_trailing_slash() {
        let p = RoutePattern::parse("/ride/book/").unwrap();
        assert_eq!(p.segments(), &[literal("ride"), literal("book")]);
        assert_eq!(p.raw(), "/ride/book/");
    }

    #[test]
    fn test_parse_wildcard_last() {
        let p = RoutePattern::parse("files/*").unwrap();
        assert_eq!(p.segments(), &[literal("files"), Segment::Wildcard]);
        assert!(p.has_wildcard());
    }

    #[test]
    fn test_parse_wildcard_not_last_fails() {
        let err = RoutePattern::parse("a/*/b").unwrap_err();
        assert!(matches!(err, DeepLinkError::InvalidPattern { .. }));
        assert!(err.to_string().contains("wildcard"));
    }

    #[test]
    fn test_parse_duplicate_parameter_fails() {
        let err = RoutePattern::parse("users/:id/posts/:id").unwrap_err();
        assert!(err.to_string().contains("duplicate parameter name 'id'"));
    }

    #[test]
    fn test_parse_empty_segment_fails() {
        assert!(RoutePattern::parse("a//b").is_err());
        assert!(RoutePattern::parse("").is_err());
        assert!(RoutePattern::parse("/").is_err());
    }

    #[test]
    fn test_parse_empty_parameter_name_fails() {
        assert!(RoutePattern::parse("users/:").is_err());
        assert!(RoutePattern::parse("users/:([0-9]+)").is_err());
    }

    #[test]
    fn test_parse_parameter_name_is_remainder() {
        let p = RoutePattern::parse("users/:user-id/:v1.2").unwrap();
        assert_eq!(p.segments(), &[literal("users"), param("user-id"), param("v1.2")]);
    }

    #[test]
    fn test_parse_literal_with_parentheses() {
        let p = RoutePattern::parse("promo/off(today").unwrap();
        assert_eq!(p.segments(), &[literal("promo"), literal("off(today")]);

        let p = RoutePattern::parse("promo/50%off)/(x/y)").unwrap();
        assert_eq!(
            p.segments(),
            &[literal("promo"), literal("50%off)"), literal("(x"), literal("y)")]
        );
    }

    #[test]
    fn test_parse_constraint() {
        let p = RoutePattern::parse("timeline/:id([0-9]+)").unwrap();
        assert_eq!(
            p.segments()[1],
            Segment::Parameter {
                name: "id".to_string(),
                constraint: Some("[0-9]+".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_constraint_with_slash_does_not_split() {
        let p = RoutePattern::parse("a/:v(x/y|z)").unwrap();
        assert_eq!(p.segments().len(), 2);
        assert_eq!(p.segments()[1].to_string(), ":v(x/y|z)");
    }

    #[test]
    fn test_parse_constraint_escaped_paren() {
        let p = RoutePattern::parse(r"a/:v(\(x)").unwrap();
        assert_eq!(p.segments().len(), 2);
    }

    #[test]
    fn test_parse_bad_constraints_fail() {
        assert!(RoutePattern::parse("a/:id([0-9]+").is_err());
        assert!(RoutePattern::parse("a/:id)").is_err());
        assert!(RoutePattern::parse("a/:id()").is_err());
        assert!(RoutePattern::parse("a/:id([0-9)").is_err());
        assert!(RoutePattern::parse("a/:id([0-9]+)x").is_err());
    }

    #[test]
    fn test_literal_with_colon_inside() {
        let p = RoutePattern::parse("a:b/c").unwrap();
        assert_eq!(p.segments()[0], literal("a:b"));
    }

    #[test]
    fn test_parameter_names_in_order() {
        let p = RoutePattern::parse("u/:user/p/:post/*").unwrap();
        let names: Vec<&str> = p.parameter_names().collect();
        assert_eq!(names, vec!["user", "post"]);
    }

    #[test]
    fn test_compile_alias() {
        assert_eq!(compile("x/:y").unwrap(), RoutePattern::parse("x/:y").unwrap());
    }
}
