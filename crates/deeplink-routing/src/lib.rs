//! # deeplink-routing
//!
//! Deep link and universal link routing. Routes are registered against
//! patterns, incoming URLs are normalized and matched in registration order,
//! and the first match is dispatched to its handler with a [`DeepLink`].
//!
//! ## Modules
//!
//! - [`routes`] - Pattern grammar, matchers, and path normalization
//! - [`deep_link`] - The immutable value handed to handlers
//! - [`handler`] - Handler bindings and single-shot completion delivery
//! - [`router`] - Registration, matching, and dispatch
//! - [`activity`] - Continued user activities carrying universal links

pub mod activity;
pub mod deep_link;
pub mod handler;
pub mod router;
pub mod routes;

pub use activity::UserActivity;
pub use deep_link::DeepLink;
pub use handler::{
    CompletionSink, HandlerBinding, HandlerFactory, RouteCallback, RouteCompletion, RouteHandler,
};
pub use router::{CanHandlePredicate, Router};
pub use routes::matcher::{RouteMatcher, WILDCARD_KEY};
pub use routes::normalizer::PathNormalizer;
pub use routes::pattern::{RoutePattern, Segment};
