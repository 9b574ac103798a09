//! Path normalization for deep links and universal links.
//!
//! Before matching, a URL is reduced to a route string: its host followed by
//! its path (`dpl://foo/12345` gives `foo/12345`, `https://dpl.io/foo/12345`
//! gives `dpl.io/foo/12345`). Normalization reconciles the two link families:
//!
//! ```text
//! https://dpl.io/foo/12345  -->  /foo/12345
//! dpl://foo/12345           -->  /foo/12345
//! ```
//!
//! The host of a web URL is a site identifier and is dropped; the host of a
//! custom-scheme URL is the first route segment and is kept. An optional
//! additional host pattern then trims one more leading segment, so with the
//! pattern `site`, `https://dpl.io/site/foo/12345` also becomes `/foo/12345`.

use regex::Regex;
use url::Url;

use deeplink_core::{compile_host_pattern, DeepLinkResult};

/// Returns `true` for URLs whose host identifies a site rather than a route.
pub fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Returns the un-normalized route string for a URL: host followed by path.
///
/// # Examples
///
/// ```
/// use deeplink_routing::routes::normalizer::raw_route;
/// use url::Url;
///
/// assert_eq!(raw_route(&Url::parse("dpl://table/book/42").unwrap()), "table/book/42");
/// assert_eq!(raw_route(&Url::parse("https://dpl.io/foo").unwrap()), "dpl.io/foo");
/// ```
pub fn raw_route(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    format!("{host}{}", url.path())
}

/// Canonicalizes route strings so deep links and universal links compare equal.
#[derive(Debug, Clone, Default)]
pub struct PathNormalizer {
    host_pattern: Option<Regex>,
}

impl PathNormalizer {
    /// Creates a normalizer with an optional extra host pattern.
    ///
    /// The pattern is a regular expression that must match the whole leading
    /// segment. `None` or an empty string disables the extra trimming.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern is not a valid regular
    /// expression on its own.
    pub fn new(additional_host_pattern: Option<&str>) -> DeepLinkResult<Self> {
        let host_pattern = additional_host_pattern
            .filter(|pattern| !pattern.is_empty())
            .map(compile_host_pattern)
            .transpose()?;
        Ok(Self { host_pattern })
    }

    /// Returns `true` if an additional host pattern is configured.
    pub const fn has_host_pattern(&self) -> bool {
        self.host_pattern.is_some()
    }

    /// Normalizes the route of `url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use deeplink_routing::routes::normalizer::PathNormalizer;
    /// use url::Url;
    ///
    /// let normalizer = PathNormalizer::new(Some("site")).unwrap();
    /// let url = Url::parse("https://dpl.io/site/foo/12345").unwrap();
    /// assert_eq!(normalizer.normalize(&url), "/foo/12345");
    /// ```
    pub fn normalize(&self, url: &Url) -> String {
        self.normalize_route(&raw_route(url), url)
    }

    /// Normalizes a route string taken from `url`.
    ///
    /// `route` is either the raw route of `url` (host followed by path) or an
    /// already-normalized path. A rooted path other than the raw route is
    /// taken as already normalized and returned unchanged.
    pub fn normalize_route(&self, route: &str, url: &Url) -> String {
        if route.starts_with('/') && route != raw_route(url) {
            return route.to_string();
        }

        let mut path = route;

        if is_web_url(url) && !path.starts_with('/') {
            if let Some(host) = url.host_str() {
                if let Some(rest) = path.strip_prefix(host) {
                    if rest.is_empty() || rest.starts_with('/') {
                        path = rest;
                    }
                }
            }
        }

        let mut normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if let Some(host_pattern) = &self.host_pattern {
            let (leading, rest) = normalized[1..]
                .split_once('/')
                .unwrap_or((&normalized[1..], ""));
            if host_pattern.is_match(leading) {
                normalized = format!("/{rest}");
            }
        }

        tracing::debug!(route, normalized = %normalized, "normalized route");
        normalized
    }
}
