//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `DEEPLINK_DEBUG` | `debug` |
//! | `DEEPLINK_LOG_LEVEL` | `log_level` |
//! | `DEEPLINK_USE_START_ANCHORS` | `router.use_start_anchors` |
//! | `DEEPLINK_USE_NORMALIZED_PATHS` | `router.use_normalized_paths` |
//! | `DEEPLINK_ADDITIONAL_HOST_PATTERN` | `router.additional_host_pattern` (empty clears it) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use deeplink_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/deeplink.toml").unwrap();
//! let settings = settings_loader::from_toml_file_with_env("config/deeplink.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::DeepLinkError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed, cannot be deserialized, or
/// carries an invalid `additional_host_pattern`.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, DeepLinkError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| DeepLinkError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let settings = merge_over_defaults(toml_to_json(toml_value), "TOML")?;
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, DeepLinkError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        DeepLinkError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the TOML is malformed, or an
/// override produces an invalid host pattern.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DeepLinkError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, DeepLinkError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| DeepLinkError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    let settings = merge_over_defaults(json_value, "JSON")?;
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, DeepLinkError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        DeepLinkError::ConfigurationError(format!(
            "Failed to read JSON file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_json_str(&content)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the JSON is malformed, or an
/// override produces an invalid host pattern.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DeepLinkError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
///
/// # Errors
///
/// Returns an error if `DEEPLINK_ADDITIONAL_HOST_PATTERN` is not a valid regex.
pub fn from_env() -> Result<Settings, DeepLinkError> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Applies environment variable overrides to a settings struct.
///
/// See the module documentation for the supported variables.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Applies overrides using `lookup` to resolve each `DEEPLINK_*` variable.
///
/// Boolean values accept "true"/"1"/"yes" (case-insensitive) as `true`;
/// anything else is `false`.
pub fn apply_overrides_from<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("DEEPLINK_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Some(val) = lookup("DEEPLINK_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("DEEPLINK_USE_START_ANCHORS") {
        settings.router.use_start_anchors = parse_flag(&val);
    }

    if let Some(val) = lookup("DEEPLINK_USE_NORMALIZED_PATHS") {
        settings.router.use_normalized_paths = parse_flag(&val);
    }

    if let Some(val) = lookup("DEEPLINK_ADDITIONAL_HOST_PATTERN") {
        let val = val.trim().to_string();
        settings.router.additional_host_pattern = if val.is_empty() { None } else { Some(val) };
    }
}

/// Checks values that deserialization alone cannot reject.
///
/// # Errors
///
/// Returns [`DeepLinkError::ConfigurationError`] if the additional host
/// pattern is not a valid regular expression.
pub fn validate(settings: &Settings) -> Result<(), DeepLinkError> {
    settings.router.compiled_host_pattern()?;
    Ok(())
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, DeepLinkError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        DeepLinkError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        DeepLinkError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
