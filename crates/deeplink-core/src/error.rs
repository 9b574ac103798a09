//! Core error types for deeplink.
//!
//! This module provides [`DeepLinkError`], the single error enum shared by the
//! registration API, the dispatch pipeline, and settings loading. Registration
//! failures are returned synchronously; every other variant is delivered to
//! the caller through a route completion.

use thiserror::Error;

/// A boxed, thread-safe error used as the cause of handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type for deeplink.
///
/// Each variant maps to a stable numeric code via [`DeepLinkError::code`].
#[derive(Error, Debug)]
pub enum DeepLinkError {
    // ── Registration ─────────────────────────────────────────────────

    /// A route pattern violates the pattern grammar.
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The raw pattern string that was rejected.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    // ── Dispatch ─────────────────────────────────────────────────────

    /// The application gate rejected the link before any matching happened.
    #[error("The application cannot handle deep links right now")]
    ApplicationCannotHandle,

    /// No registered route matched the incoming URL.
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    /// Constructing or invoking the bound handler failed.
    #[error("Handler for route '{route}' failed: {source}")]
    HandlerInvocationFailed {
        /// The raw pattern of the matched route.
        route: String,
        /// The underlying cause.
        #[source]
        source: BoxError,
    },

    /// A handler completed with an error of its own.
    #[error("Handler reported an error: {0}")]
    Handler(#[source] BoxError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl DeepLinkError {
    /// Creates an [`InvalidPattern`](Self::InvalidPattern) error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an arbitrary error reported by a handler.
    pub fn handler(source: impl Into<BoxError>) -> Self {
        Self::Handler(source.into())
    }

    /// Returns the numeric code associated with this error.
    ///
    /// - `RouteNotFound` -> 1
    /// - `HandlerInvocationFailed` -> 2
    /// - `ApplicationCannotHandle` -> 3
    /// - `InvalidPattern` -> 4
    /// - `Handler` -> 5
    /// - `ConfigurationError` -> 6
    pub const fn code(&self) -> i64 {
        match self {
            Self::RouteNotFound(_) => 1,
            Self::HandlerInvocationFailed { .. } => 2,
            Self::ApplicationCannotHandle => 3,
            Self::InvalidPattern { .. } => 4,
            Self::Handler(_) => 5,
            Self::ConfigurationError(_) => 6,
        }
    }

    /// Returns `true` for failures that only affect a single routing attempt.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidPattern { .. } | Self::ConfigurationError(_)
        )
    }
}

/// A convenience type alias for `Result<T, DeepLinkError>`.
pub type DeepLinkResult<T> = Result<T, DeepLinkError>;
