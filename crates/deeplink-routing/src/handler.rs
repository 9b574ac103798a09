//! Route handler bindings and completion delivery.
//!
//! A route is bound to either a handler *type* (instantiated per dispatch
//! through a [`HandlerFactory`]) or a synchronous [`RouteCallback`]. Handler
//! types receive a [`CompletionSink`] and may finish immediately or later,
//! from any thread.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use deeplink_core::{BoxError, DeepLinkError};

use crate::deep_link::DeepLink;

/// The caller's completion: `(handled, error)`.
pub type RouteCompletion = Box<dyn FnOnce(bool, Option<DeepLinkError>) + Send>;

/// Creates a fresh handler instance for one dispatch.
pub type HandlerFactory =
    Arc<dyn Fn(&DeepLink) -> Result<Box<dyn RouteHandler>, BoxError> + Send + Sync>;

/// A synchronous callback invoked with the matched deep link.
pub type RouteCallback = Arc<dyn Fn(&DeepLink) + Send + Sync>;

/// A handler type bound to a route.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use deeplink_routing::{CompletionSink, DeepLink, RouteHandler};
///
/// #[derive(Default)]
/// struct BookingHandler;
///
/// impl RouteHandler for BookingHandler {
///     fn handle(self: Box<Self>, deep_link: Arc<DeepLink>, completion: CompletionSink) {
///         match deep_link.get("id") {
///             Some(_) => completion.succeed(),
///             None => completion.fail("missing booking id"),
///         };
///     }
/// }
/// ```
pub trait RouteHandler: Send {
    /// Decides whether this handler wants the link at all.
    ///
    /// Returning `false` completes the dispatch with `handled = false` and
    /// no error; [`handle`](Self::handle) is not called.
    fn should_handle(&self, _deep_link: &DeepLink) -> bool {
        true
    }

    /// Handles the link and eventually signals `completion`.
    ///
    /// Only the first signal sent through `completion` (or any of its clones)
    /// reaches the caller.
    fn handle(self: Box<Self>, deep_link: Arc<DeepLink>, completion: CompletionSink);
}

/// What a registered route dispatches to.
#[derive(Clone)]
pub enum HandlerBinding {
    /// A handler type, instantiated per dispatch.
    Class(HandlerFactory),
    /// A synchronous callback; success once it returns.
    Callback(RouteCallback),
}

impl HandlerBinding {
    /// Binds a handler type that is built with `Default` for each dispatch.
    pub fn class<H>() -> Self
    where
        H: RouteHandler + Default + 'static,
    {
        Self::Class(Arc::new(|_deep_link: &DeepLink| {
            Ok::<_, BoxError>(Box::new(H::default()) as Box<dyn RouteHandler>)
        }))
    }

    /// Binds a synchronous callback.
    pub fn callback<F>(callback: F) -> Self
    where
        F: Fn(&DeepLink) + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(callback))
    }

    /// Returns `true` for handler-type bindings.
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    /// Returns `true` for callback bindings.
    pub const fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(_) => f.write_str("Class(..)"),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Delivers exactly one completion signal to the caller.
///
/// Clones share the same slot: the first call to [`complete`](Self::complete)
/// on any clone forwards the signal, and every later call is ignored.
#[derive(Clone)]
pub struct CompletionSink {
    slot: Arc<Mutex<Option<RouteCompletion>>>,
    route: Arc<str>,
}

impl CompletionSink {
    /// Wraps a completion for the given route.
    pub fn new<F>(route: &str, completion: F) -> Self
    where
        F: FnOnce(bool, Option<DeepLinkError>) + Send + 'static,
    {
        Self {
            slot: Arc::new(Mutex::new(Some(Box::new(completion)))),
            route: Arc::from(route),
        }
    }

    /// Returns the raw pattern of the route being handled.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Forwards `(handled, error)` to the caller if no signal was sent yet.
    ///
    /// Returns `true` if this call delivered the signal.
    pub fn complete(&self, handled: bool, error: Option<DeepLinkError>) -> bool {
        let completion = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match completion {
            Some(completion) => {
                completion(handled, error);
                true
            }
            None => {
                tracing::warn!(
                    route = %self.route,
                    handled,
                    "ignoring duplicate completion signal"
                );
                false
            }
        }
    }

    /// Reports success.
    pub fn succeed(&self) -> bool {
        self.complete(true, None)
    }

    /// Reports failure with a handler-specific error.
    pub fn fail(&self, error: impl Into<BoxError>) -> bool {
        self.complete(false, Some(DeepLinkError::handler(error)))
    }

    /// Returns `true` once a signal has been delivered.
    pub fn is_completed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for CompletionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSink")
            .field("route", &self.route)
            .field("completed", &self.is_completed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_first_signal_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(None));

        let (c, s) = (calls.clone(), seen.clone());
        let sink = CompletionSink::new("a/:b", move |handled, error| {
            c.fetch_add(1, Ordering::SeqCst);
            *s.lock().unwrap() = Some((handled, error.is_some()));
        });

        assert!(!sink.is_completed());
        assert!(sink.succeed());
        assert!(!sink.fail("too late"));
        assert!(!sink.clone().complete(false, None));

        assert!(sink.is_completed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), Some((true, false)));
    }

    #[test]
    fn test_fail_wraps_handler_error() {
        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let sink = CompletionSink::new("r", move |handled, error| {
            *s.lock().unwrap() = Some((handled, error));
        });

        sink.fail("network down");
        let (handled, error) = seen.lock().unwrap().take().unwrap();
        assert!(!handled);
        let error = error.unwrap();
        assert!(matches!(error, DeepLinkError::Handler(_)));
        assert!(error.to_string().contains("network down"));
    }

    #[test]
    fn test_clones_share_slot_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sink = CompletionSink::new("r", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = sink.clone();
                std::thread::spawn(move || sink.succeed())
            })
            .collect();
        let delivered = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|delivered| *delivered)
            .count();

        assert_eq!(delivered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_binding_kinds() {
        #[derive(Default)]
        struct Noop;
        impl RouteHandler for Noop {
            fn handle(self: Box<Self>, _deep_link: Arc<DeepLink>, completion: CompletionSink) {
                completion.succeed();
            }
        }

        let class = HandlerBinding::class::<Noop>();
        let callback = HandlerBinding::callback(|_link: &DeepLink| {});
        assert!(class.is_class());
        assert!(callback.is_callback());
        assert_eq!(format!("{class:?}"), "Class(..)");
        assert_eq!(format!("{callback:?}"), "Callback(..)");
    }

    #[test]
    fn test_sink_debug_and_route() {
        let sink = CompletionSink::new("table/book/:id", |_, _| {});
        assert_eq!(sink.route(), "table/book/:id");
        assert!(format!("{sink:?}").contains("table/book/:id"));
    }
}
