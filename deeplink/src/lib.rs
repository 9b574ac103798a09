//! # deeplink
//!
//! Deep link and universal link routing for applications.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `deeplink` to get everything, or on the individual
//! crates for finer-grained control.
//!
//! # Examples
//!
//! ```
//! use deeplink::prelude::*;
//!
//! let mut router = Router::new();
//! router.set_use_normalized_paths(true);
//! router.register_callback(|link: &DeepLink| {
//!     deeplink::tracing::info!(id = link.get("id"), "opening product");
//! }, "product/:id").unwrap();
//!
//! let url = Url::parse("https://shop.example/product/7").unwrap();
//! assert!(router.handle(&url, |handled, error| {
//!     assert!(handled && error.is_none());
//! }));
//! ```

/// Error types, settings, settings loading, and logging setup.
pub use deeplink_core as core;

/// Route patterns, normalization, deep links, and the router.
#[cfg(feature = "routing")]
pub use deeplink_routing as routing;

// Third-party crates used in the public API.
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;
pub use url;

/// The most commonly used types, importable with `use deeplink::prelude::*`.
pub mod prelude {
    pub use deeplink_core::logging::setup_logging;
    pub use deeplink_core::{BoxError, DeepLinkError, DeepLinkResult, RouterConfig, Settings};

    #[cfg(feature = "routing")]
    pub use deeplink_routing::{
        CompletionSink, DeepLink, HandlerBinding, RouteHandler, Router, UserActivity,
        WILDCARD_KEY,
    };

    pub use url::Url;
}
