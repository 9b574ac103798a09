//! The deep link router.
//!
//! [`Router`] owns an ordered registry of routes. For each incoming URL it
//! checks the application gate, computes the candidate route string, scans
//! the registry in registration order, builds a [`DeepLink`] from the first
//! match, and dispatches it to the bound handler. Every outcome, including
//! failures, reaches the caller through the completion.
//!
//! Registration takes `&mut self` and is expected to finish before routing
//! starts; `handle` only reads the registry, so a built router can be shared
//! across threads behind an `Arc`.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use url::Url;

use deeplink_core::logging::route_span;
use deeplink_core::{BoxError, DeepLinkError, DeepLinkResult, RouterConfig, Settings};

use crate::activity::UserActivity;
use crate::deep_link::DeepLink;
use crate::handler::{CompletionSink, HandlerBinding, RouteHandler};
use crate::routes::matcher::RouteMatcher;
use crate::routes::normalizer::{raw_route, PathNormalizer};

/// Decides whether the application can handle deep links right now.
pub type CanHandlePredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// A registered route: its compiled matcher, its binding, and its position.
pub struct RegistryEntry {
    matcher: RouteMatcher,
    binding: HandlerBinding,
    index: usize,
}

impl RegistryEntry {
    /// Returns the compiled matcher.
    pub const fn matcher(&self) -> &RouteMatcher {
        &self.matcher
    }

    /// Returns the handler binding.
    pub const fn binding(&self) -> &HandlerBinding {
        &self.binding
    }

    /// Returns the registration index; lower indices take precedence.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the raw route pattern.
    pub fn route(&self) -> &str {
        self.matcher.route()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("route", &self.route())
            .field("binding", &self.binding)
            .field("index", &self.index)
            .finish()
    }
}

/// Routes deep links and universal links to registered handlers.
///
/// # Examples
///
/// ```
/// use deeplink_routing::Router;
/// use url::Url;
///
/// let mut router = Router::new();
/// router
///     .register_callback(|link| println!("booking {}", link.get("id").unwrap()), "table/book/:id")
///     .unwrap();
///
/// let url = Url::parse("dpl://table/book/42").unwrap();
/// let matched = router.handle(&url, |handled, error| {
///     assert!(handled);
///     assert!(error.is_none());
/// });
/// assert!(matched);
/// ```
#[derive(Default)]
pub struct Router {
    entries: Vec<RegistryEntry>,
    config: RouterConfig,
    normalizer: PathNormalizer,
    can_handle: Option<CanHandlePredicate>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("entries", &self.entries)
            .field("config", &self.config)
            .field("has_gate", &self.can_handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates an empty router with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty router with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::ConfigurationError`] if the additional host
    /// pattern is not a valid regular expression.
    pub fn with_config(config: RouterConfig) -> DeepLinkResult<Self> {
        let normalizer = PathNormalizer::new(config.host_pattern())?;
        Ok(Self {
            config,
            normalizer,
            ..Self::default()
        })
    }

    /// Creates an empty router from loaded settings.
    ///
    /// # Errors
    ///
    /// See [`Router::with_config`].
    pub fn from_settings(settings: &Settings) -> DeepLinkResult<Self> {
        Self::with_config(settings.router.clone())
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Returns the current configuration.
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Anchors every route at the start of the candidate path.
    pub fn set_use_start_anchors(&mut self, enabled: bool) {
        self.config.use_start_anchors = enabled;
    }

    /// Normalizes paths before matching.
    pub fn set_use_normalized_paths(&mut self, enabled: bool) {
        self.config.use_normalized_paths = enabled;
    }

    /// Sets or clears the additional host pattern used during normalization.
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::ConfigurationError`] if `pattern` is not a
    /// valid regular expression; the previous pattern is kept.
    pub fn set_additional_host_pattern(&mut self, pattern: Option<&str>) -> DeepLinkResult<()> {
        self.normalizer = PathNormalizer::new(pattern)?;
        self.config.additional_host_pattern = pattern.map(String::from);
        Ok(())
    }

    /// Installs the application gate consulted before every routing attempt.
    pub fn set_application_can_handle_deep_links<F>(&mut self, predicate: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.can_handle = Some(Arc::new(predicate));
    }

    /// Removes the application gate; every link is allowed again.
    pub fn clear_application_can_handle_deep_links(&mut self) {
        self.can_handle = None;
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Binds a handler factory to `route`.
    ///
    /// The factory runs once per dispatch and receives the matched link.
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::InvalidPattern`] if `route` is invalid; the
    /// registry is left unchanged.
    pub fn register_class<F>(&mut self, factory: F, route: &str) -> DeepLinkResult<()>
    where
        F: Fn(&DeepLink) -> Result<Box<dyn RouteHandler>, BoxError> + Send + Sync + 'static,
    {
        self.register(HandlerBinding::Class(Arc::new(factory)), route)
    }

    /// Binds the handler type `H`, built with `Default`, to `route`.
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::InvalidPattern`] if `route` is invalid.
    pub fn register_handler<H>(&mut self, route: &str) -> DeepLinkResult<()>
    where
        H: RouteHandler + Default + 'static,
    {
        self.register(HandlerBinding::class::<H>(), route)
    }

    /// Binds a synchronous callback to `route`.
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::InvalidPattern`] if `route` is invalid.
    pub fn register_callback<F>(&mut self, callback: F, route: &str) -> DeepLinkResult<()>
    where
        F: Fn(&DeepLink) + Send + Sync + 'static,
    {
        self.register(HandlerBinding::callback(callback), route)
    }

    /// Appends a binding for `route`.
    ///
    /// Registering the same pattern twice appends a second entry, which the
    /// first one shadows.
    ///
    /// # Errors
    ///
    /// Returns [`DeepLinkError::InvalidPattern`] if `route` is invalid.
    pub fn register(&mut self, binding: HandlerBinding, route: &str) -> DeepLinkResult<()> {
        let matcher = RouteMatcher::from_route(route)?;
        let index = self.entries.len();
        tracing::debug!(route, index, ?binding, "registered route");
        self.entries.push(RegistryEntry {
            matcher,
            binding,
            index,
        });
        Ok(())
    }

    // ── Introspection ────────────────────────────────────────────────

    /// Returns the binding of the first entry registered for exactly `route`.
    pub fn handler_for_route(&self, route: &str) -> Option<&HandlerBinding> {
        self.entries
            .iter()
            .find(|entry| entry.route() == route)
            .map(RegistryEntry::binding)
    }

    /// Returns the raw route patterns in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(RegistryEntry::route)
    }

    /// Returns the registry entries in registration order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Returns the number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Matching ─────────────────────────────────────────────────────

    /// Normalizes `route` in the context of `url` with the current host pattern.
    pub fn normalize_route(&self, route: &str, url: &Url) -> String {
        self.normalizer.normalize_route(route, url)
    }

    /// Returns the candidate path matched against the registry for `url`.
    ///
    /// With normalization off this is the raw route (host followed by path).
    pub fn candidate_path(&self, url: &Url) -> String {
        if self.config.use_normalized_paths {
            self.normalizer.normalize(url)
        } else {
            raw_route(url)
        }
    }

    /// Finds the first entry matching `url` and builds its deep link.
    ///
    /// Does not consult the application gate and does not dispatch.
    pub fn match_url(&self, url: &Url) -> Option<(&RegistryEntry, DeepLink)> {
        let path = self.candidate_path(url);
        let anchored = self.config.use_start_anchors;

        self.entries.iter().find_map(|entry| {
            let params = entry.matcher.match_path(&path, anchored);
            tracing::debug!(
                route = entry.route(),
                path = %path,
                anchored,
                matched = params.is_some(),
                "tried route"
            );
            params.map(|params| {
                let deep_link = DeepLink::new(url.clone(), entry.route(), params);
                (entry, deep_link)
            })
        })
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Routes `url` to its handler.
    ///
    /// Returns `true` if the gate passed and a route matched. The final
    /// outcome is delivered once through `completion`, synchronously for
    /// callbacks and failures, possibly later for handler types.
    pub fn handle<F>(&self, url: &Url, completion: F) -> bool
    where
        F: FnOnce(bool, Option<DeepLinkError>) + Send + 'static,
    {
        let span = route_span(url.as_str());
        let _guard = span.enter();

        if let Some(can_handle) = &self.can_handle {
            let allowed = catch_unwind(AssertUnwindSafe(|| can_handle())).unwrap_or(false);
            if !allowed {
                tracing::warn!("application cannot handle deep links, rejecting");
                completion(false, Some(DeepLinkError::ApplicationCannotHandle));
                return false;
            }
        }

        let Some((entry, deep_link)) = self.match_url(url) else {
            tracing::warn!("no registered route matches");
            completion(
                false,
                Some(DeepLinkError::RouteNotFound(format!(
                    "The URL '{url}' does not match a registered route"
                ))),
            );
            return false;
        };

        tracing::info!(route = entry.route(), index = entry.index(), "dispatching deep link");
        let sink = CompletionSink::new(entry.route(), completion);
        dispatch(entry, deep_link, &sink);
        true
    }

    /// Parses `url` and routes it; an unparsable URL completes with `RouteNotFound`.
    pub fn handle_str<F>(&self, url: &str, completion: F) -> bool
    where
        F: FnOnce(bool, Option<DeepLinkError>) + Send + 'static,
    {
        match Url::parse(url) {
            Ok(url) => self.handle(&url, completion),
            Err(e) => {
                tracing::warn!(url, error = %e, "unparsable deep link URL");
                completion(
                    false,
                    Some(DeepLinkError::RouteNotFound(format!("Invalid URL '{url}': {e}"))),
                );
                false
            }
        }
    }

    /// Routes the URL carried by a continued user activity.
    ///
    /// Activities without a routable URL complete with `RouteNotFound`.
    pub fn handle_user_activity<F>(&self, activity: &UserActivity, completion: F) -> bool
    where
        F: FnOnce(bool, Option<DeepLinkError>) + Send + 'static,
    {
        if let Some(url) = activity.url() {
            return self.handle(url, completion);
        }

        tracing::warn!(
            activity_type = %activity.activity_type,
            "user activity carries no routable URL"
        );
        completion(
            false,
            Some(DeepLinkError::RouteNotFound(format!(
                "User activity '{}' carries no routable URL",
                activity.activity_type
            ))),
        );
        false
    }
}

/// Invokes the entry's binding; failures go through `sink`, never up the stack.
fn dispatch(entry: &RegistryEntry, deep_link: DeepLink, sink: &CompletionSink) {
    match &entry.binding {
        HandlerBinding::Callback(callback) => {
            match catch_unwind(AssertUnwindSafe(|| callback(&deep_link))) {
                Ok(()) => {
                    sink.succeed();
                }
                Err(panic) => report_failure(entry, sink, panic_message(panic.as_ref()).into()),
            }
        }
        HandlerBinding::Class(factory) => {
            let deep_link = Arc::new(deep_link);
            let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<bool, BoxError> {
                let handler = factory(deep_link.as_ref())?;
                if !handler.should_handle(&deep_link) {
                    return Ok(false);
                }
                handler.handle(Arc::clone(&deep_link), sink.clone());
                Ok(true)
            }));

            match outcome {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    tracing::info!(route = entry.route(), "handler declined deep link");
                    sink.complete(false, None);
                }
                Ok(Err(source)) => report_failure(entry, sink, source),
                Err(panic) => report_failure(entry, sink, panic_message(panic.as_ref()).into()),
            }
        }
    }
}

fn report_failure(entry: &RegistryEntry, sink: &CompletionSink, source: BoxError) {
    tracing::warn!(route = entry.route(), error = %source, "handler invocation failed");
    sink.complete(
        false,
        Some(DeepLinkError::HandlerInvocationFailed {
            route: entry.route().to_string(),
            source,
        }),
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
