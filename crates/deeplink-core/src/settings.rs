//! Settings for deeplink.
//!
//! This module provides [`RouterConfig`], the routing knobs read on every
//! dispatch, and [`Settings`], which adds the logging configuration. Both are
//! plain values owned by the host application; there is no global instance.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DeepLinkError, DeepLinkResult};

/// Routing configuration read by the router on every `handle` call.
///
/// # Examples
///
/// ```
/// use deeplink_core::settings::RouterConfig;
///
/// let config = RouterConfig::default();
/// assert!(!config.use_start_anchors);
/// assert!(!config.use_normalized_paths);
/// assert!(config.additional_host_pattern.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Match every route from the start of the candidate path (an implicit `^`).
    pub use_start_anchors: bool,
    /// Normalize deep link and universal link paths into one shape before matching.
    pub use_normalized_paths: bool,
    /// Pattern for an extra leading segment trimmed during normalization
    /// (e.g. `site` turns `/site/foo` into `/foo`).
    pub additional_host_pattern: Option<String>,
}

impl RouterConfig {
    /// Returns the additional host pattern if it is set and non-empty.
    pub fn host_pattern(&self) -> Option<&str> {
        self.additional_host_pattern
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
    }

    /// Compiles the additional host pattern, if set, with [`compile_host_pattern`].
    pub fn compiled_host_pattern(&self) -> DeepLinkResult<Option<Regex>> {
        self.host_pattern().map(compile_host_pattern).transpose()
    }
}

/// Compiles a host pattern into a regex that must match a whole segment.
///
/// The pattern is compiled on its own first, so text that would escape the
/// anchoring group (such as `a)|(b`) is rejected rather than reinterpreted.
///
/// # Examples
///
/// ```
/// use deeplink_core::settings::compile_host_pattern;
///
/// let regex = compile_host_pattern("(en|fr)-site").unwrap();
/// assert!(regex.is_match("fr-site"));
/// assert!(!regex.is_match("fr-site2"));
/// assert!(compile_host_pattern("a)|(b").is_err());
/// ```
///
/// # Errors
///
/// Returns [`DeepLinkError::ConfigurationError`] if the pattern is not a
/// valid regular expression.
pub fn compile_host_pattern(pattern: &str) -> DeepLinkResult<Regex> {
    let invalid = |e: regex::Error| {
        DeepLinkError::ConfigurationError(format!(
            "Invalid additional_host_pattern '{pattern}': {e}"
        ))
    };
    Regex::new(pattern).map_err(invalid)?;
    Regex::new(&format!("^(?:{pattern})$")).map_err(invalid)
}

/// The complete set of deeplink settings.
///
/// # Examples
///
/// ```
/// use deeplink_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log level filter (e.g. "info", "debug", "deeplink_routing=trace").
    pub log_level: String,
    /// Routing configuration.
    pub router: RouterConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            router: RouterConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.router, RouterConfig::default());
    }

    #[test]
    fn test_host_pattern_ignores_empty() {
        let mut config = RouterConfig::default();
        assert_eq!(config.host_pattern(), None);

        config.additional_host_pattern = Some(String::new());
        assert_eq!(config.host_pattern(), None);

        config.additional_host_pattern = Some("site".to_string());
        assert_eq!(config.host_pattern(), Some("site"));
    }

    #[test]
    fn test_compile_host_pattern_whole_segment() {
        let regex = compile_host_pattern("site|web").unwrap();
        assert!(regex.is_match("site"));
        assert!(regex.is_match("web"));
        assert!(!regex.is_match("website"));
    }

    #[test]
    fn test_compile_host_pattern_rejects_group_escape() {
        let err = compile_host_pattern("a)|(b").unwrap_err();
        assert!(matches!(err, DeepLinkError::ConfigurationError(_)));
        assert!(err.to_string().contains("a)|(b"));
    }

    #[test]
    fn test_compiled_host_pattern() {
        let mut config = RouterConfig::default();
        assert!(config.compiled_host_pattern().unwrap().is_none());

        config.additional_host_pattern = Some("site".to_string());
        assert!(config.compiled_host_pattern().unwrap().is_some());

        config.additional_host_pattern = Some("site((".to_string());
        assert!(config.compiled_host_pattern().is_err());
    }

    #[test]
    fn test_router_config_deserialize_partial() {
        let config: RouterConfig =
            serde_json::from_str(r#"{"use_start_anchors": true}"#).unwrap();
        assert!(config.use_start_anchors);
        assert!(!config.use_normalized_paths);
        assert!(config.additional_host_pattern.is_none());
    }
}
