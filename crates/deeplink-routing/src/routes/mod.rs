//! Route patterns, matching, and path normalization.
//!
//! - [`pattern`]: the route pattern grammar (`literal`, `:param`, `:param(regex)`, `*`)
//! - [`matcher`]: compiled matchers that extract parameters from a path
//! - [`normalizer`]: canonical route strings for deep links and universal links
//!
//! # Examples
//!
//! ```
//! use deeplink_routing::routes::matcher::RouteMatcher;
//!
//! let matcher = RouteMatcher::from_route("table/book/:id").unwrap();
//! let params = matcher.match_path("table/book/42", true).unwrap();
//! assert_eq!(params["id"], "42");
//! assert!(matcher.match_path("table/book/42/extra", true).is_none());
//! ```

pub mod matcher;
pub mod normalizer;
pub mod pattern;
