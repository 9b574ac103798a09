//! # deeplink-core
//!
//! Core types shared by every deeplink crate. This crate has no routing logic
//! and provides the foundation the routing crate builds on.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result aliases
//! - [`settings`] - Router configuration and settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{BoxError, DeepLinkError, DeepLinkResult};
pub use settings::{compile_host_pattern, RouterConfig, Settings};
