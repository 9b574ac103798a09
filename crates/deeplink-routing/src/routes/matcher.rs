//! Compiled route matching.
//!
//! A [`RouteMatcher`] owns one [`RoutePattern`] and the regexes compiled from
//! it. It is built once at registration time and is read-only afterwards, so
//! it can be shared freely between threads.
//!
//! Matching is always anchored at the end of the candidate path (an optional
//! trailing `/` is tolerated). Anchoring at the start is optional: an
//! unanchored pattern may begin anywhere in the path, so `site` matches
//! `/foo/visit-site`, while the anchored form only matches `/site` or `site`.
//! Both forms accept one optional leading `/`, so a wildcard never captures it.
//!
//! Candidate paths come from [`url::Url`] and are percent-encoded, so literal
//! segments are encoded the same way before they are compiled.

use std::collections::HashMap;
use std::fmt::Write as _;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Captures, Regex};

use deeplink_core::{DeepLinkError, DeepLinkResult};

use super::pattern::{RoutePattern, Segment};

/// The parameter key under which a wildcard's captured remainder is exposed.
pub const WILDCARD_KEY: &str = "*";

const WILDCARD_GROUP: &str = "wildcard";

/// Bytes the `url` crate percent-encodes in a path.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One capture group of the compiled regex and what it feeds.
#[derive(Debug)]
enum Capture {
    Parameter {
        name: String,
        group: String,
        constraint: Option<Regex>,
    },
    Wildcard,
}

/// A route pattern compiled for matching.
#[derive(Debug)]
pub struct RouteMatcher {
    pattern: RoutePattern,
    anchored: Regex,
    unanchored: Regex,
    captures: Vec<Capture>,
}

impl RouteMatcher {
    /// Compiles a matcher from an already-parsed pattern.
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::InvalidPattern`] if the generated regex fails
    /// to compile.
    pub fn new(pattern: RoutePattern) -> DeepLinkResult<Self> {
        let mut body = String::new();
        let mut captures = Vec::new();

        for (idx, segment) in pattern.segments().iter().enumerate() {
            if idx > 0 {
                body.push('/');
            }
            match segment {
                Segment::Literal(text) => {
                    let encoded = utf8_percent_encode(text, PATH_ENCODE_SET).to_string();
                    body.push_str(&regex::escape(&encoded));
                }
                Segment::Parameter { name, constraint } => {
                    let group = format!("p{idx}");
                    write!(body, "(?P<{group}>[^/]+)").ok();
                    let constraint = constraint
                        .as_deref()
                        .map(|c| compile_regex(pattern.raw(), &format!("^(?:{c})$")))
                        .transpose()?;
                    captures.push(Capture::Parameter {
                        name: name.clone(),
                        group,
                        constraint,
                    });
                }
                Segment::Wildcard => {
                    write!(body, "(?P<{WILDCARD_GROUP}>.*)").ok();
                    captures.push(Capture::Wildcard);
                }
            }
        }

        let anchored = compile_regex(pattern.raw(), &format!("^/?{body}/?$"))?;
        let unanchored = compile_regex(pattern.raw(), &format!("/?{body}/?$"))?;

        Ok(Self {
            pattern,
            anchored,
            unanchored,
            captures,
        })
    }

    /// Parses and compiles a route pattern string.
    ///
    /// # Examples
    ///
    /// ```
    /// use deeplink_routing::routes::matcher::RouteMatcher;
    ///
    /// let matcher = RouteMatcher::from_route("table/book/:id").unwrap();
    /// let params = matcher.match_path("/table/book/42", true).unwrap();
    /// assert_eq!(params["id"], "42");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::InvalidPattern`] if the pattern is invalid.
    pub fn from_route(route: &str) -> DeepLinkResult<Self> {
        Self::new(RoutePattern::parse(route)?)
    }

    /// Returns the parsed pattern.
    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Returns the raw route string.
    pub fn route(&self) -> &str {
        self.pattern.raw()
    }

    /// Matches `path` against the pattern.
    ///
    /// Returns the decoded parameter values keyed by name (the wildcard
    /// remainder under [`WILDCARD_KEY`]), or `None` if the path does not
    /// match. When `anchored` is false the leftmost match wins.
    pub fn match_path(&self, path: &str, anchored: bool) -> Option<HashMap<String, String>> {
        let regex = if anchored {
            &self.anchored
        } else {
            &self.unanchored
        };

        let mut start = 0;
        while start <= path.len() {
            let captures = regex.captures_at(path, start)?;
            let found = captures.get(0)?;
            if let Some(params) = self.extract(&captures) {
                return Some(params);
            }
            if anchored {
                return None;
            }
            // A constraint rejected this candidate; retry from the next start position.
            start = path[found.start()..]
                .chars()
                .next()
                .map_or(path.len() + 1, |c| found.start() + c.len_utf8());
        }
        None
    }

    /// Returns `true` if `path` matches the pattern.
    pub fn is_match(&self, path: &str, anchored: bool) -> bool {
        self.match_path(path, anchored).is_some()
    }

    fn extract(&self, captures: &Captures<'_>) -> Option<HashMap<String, String>> {
        let mut params = HashMap::with_capacity(self.captures.len());
        for capture in &self.captures {
            match capture {
                Capture::Parameter {
                    name,
                    group,
                    constraint,
                } => {
                    let value = decode(captures.name(group)?.as_str());
                    if let Some(constraint) = constraint {
                        if !constraint.is_match(&value) {
                            return None;
                        }
                    }
                    params.insert(name.clone(), value);
                }
                Capture::Wildcard => {
                    let value = captures.name(WILDCARD_GROUP).map_or("", |m| m.as_str());
                    params.insert(WILDCARD_KEY.to_string(), decode(value));
                }
            }
        }
        Some(params)
    }
}

fn compile_regex(route: &str, source: &str) -> DeepLinkResult<Regex> {
    Regex::new(source).map_err(|e| DeepLinkError::invalid_pattern(route, e.to_string()))
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(route: &str) -> RouteMatcher {
        RouteMatcher::from_route(route).unwrap()
    }

    #[test]
    fn test_parameter_captured() {
        let m = matcher("table/book/:id");
        let params = m.match_path("/table/book/42", false).unwrap();
        assert_eq!(params.get("id").unwrap(), "42");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_anchored_parameter_captured() {
        let m = matcher("table/book/:id");
        assert_eq!(m.match_path("/table/book/42", true).unwrap()["id"], "42");
        assert_eq!(m.match_path("table/book/42", true).unwrap()["id"], "42");
    }

    #[test]
    fn test_unanchored_matches_substring() {
        let m = matcher("site");
        assert!(m.is_match("/foo/visit-site", false));
        assert!(!m.is_match("/foo/visit-site", true));
        assert!(m.is_match("/site", true));
        assert!(m.is_match("site", true));
    }

    #[test]
    fn test_extra_segments_do_not_match() {
        let m = matcher("ride/book");
        assert!(!m.is_match("/ride/book/now", false));
        assert!(!m.is_match("/ride/book/now", true));
    }

    #[test]
    fn test_missing_segments_do_not_match() {
        let m = matcher("table/book/:id");
        assert!(m.match_path("/table/book", false).is_none());
        assert!(m.match_path("/table/book/", true).is_none());
    }

    #[test]
    fn test_trailing_slash_tolerated() {
        let m = matcher("ride/book");
        assert!(m.is_match("/ride/book/", true));
    }

    #[test]
    fn test_literals_case_sensitive() {
        let m = matcher("ride/book");
        assert!(!m.is_match("/Ride/Book", true));
    }

    #[test]
    fn test_literal_regex_characters_escaped() {
        let m = matcher("v1.0/items");
        assert!(m.is_match("/v1.0/items", true));
        assert!(!m.is_match("/v1x0/items", true));
    }

    #[test]
    fn test_parameter_percent_decoded() {
        let m = matcher("search/:term");
        let params = m.match_path("/search/hello%20world", true).unwrap();
        assert_eq!(params["term"], "hello world");
    }

    #[test]
    fn test_encoded_separator_stays_in_one_component() {
        let m = matcher("files/:name");
        let params = m.match_path("/files/a%2Fb", true).unwrap();
        assert_eq!(params["name"], "a/b");
    }

    #[test]
    fn test_wildcard_captures_remainder() {
        let m = matcher("files/*");
        let params = m.match_path("/files/docs/readme.md", true).unwrap();
        assert_eq!(params[WILDCARD_KEY], "docs/readme.md");
    }

    #[test]
    fn test_wildcard_may_be_empty() {
        let m = matcher("files/*");
        assert_eq!(m.match_path("/files/", true).unwrap()[WILDCARD_KEY], "");
        assert!(m.match_path("/files", true).is_none());
    }

    #[test]
    fn test_wildcard_with_parameter() {
        let m = matcher("users/:id/*");
        let params = m.match_path("/users/7/photos/2024", true).unwrap();
        assert_eq!(params["id"], "7");
        assert_eq!(params[WILDCARD_KEY], "photos/2024");
    }

    #[test]
    fn test_bare_wildcard_same_capture_either_anchoring() {
        let m = matcher("*");
        assert_eq!(m.match_path("/foo/bar", true).unwrap()[WILDCARD_KEY], "foo/bar");
        assert_eq!(m.match_path("/foo/bar", false).unwrap()[WILDCARD_KEY], "foo/bar");
        assert_eq!(m.match_path("foo/bar", false).unwrap()[WILDCARD_KEY], "foo/bar");
    }

    #[test]
    fn test_non_ascii_literal_matches_encoded_path() {
        let m = matcher("menu/café");
        assert!(m.is_match("/menu/caf%C3%A9", true));
        assert!(m.is_match("/menu/caf%C3%A9", false));
        assert!(!m.is_match("/menu/cafe", true));
    }

    #[test]
    fn test_literal_with_parentheses_matches() {
        let m = matcher("promo/off(today");
        assert!(m.is_match("/promo/off(today", true));
        assert!(!m.is_match("/promo/offtoday", true));
    }

    #[test]
    fn test_constraint_filters_values() {
        let m = matcher("timeline/:id([0-9]+)");
        assert_eq!(m.match_path("/timeline/123", true).unwrap()["id"], "123");
        assert!(m.match_path("/timeline/abc", true).is_none());
    }

    #[test]
    fn test_constraint_retries_later_start() {
        let m = matcher(":id([0-9]+)/*");
        let params = m.match_path("/x/12/rest", false).unwrap();
        assert_eq!(params["id"], "12");
        assert_eq!(params[WILDCARD_KEY], "rest");
    }

    #[test]
    fn test_constraint_with_multibyte_path() {
        let m = matcher("tag/:name([a-z]+)");
        assert!(m.match_path("/é/tag/ÄÖ", false).is_none());
        assert_eq!(m.match_path("/é/tag/abc", false).unwrap()["name"], "abc");
    }

    #[test]
    fn test_route_accessor() {
        let m = matcher("table/book/:id");
        assert_eq!(m.route(), "table/book/:id");
        assert_eq!(m.pattern().segments().len(), 3);
    }
}
