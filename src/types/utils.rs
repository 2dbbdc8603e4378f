//! Shared utility functions for JSON extraction and common operations.
//!
//! ## JSON Extraction Helpers
//!
//! Typed field lookups on `serde_json::Value` where a value of the wrong
//! primitive type reads as absent:
//! - `json_string` - non-blank strings
//! - `json_f64` - numbers only

use std::fmt::Display;

use crate::types::RequestKind;

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract a non-blank string from JSON value by key.
#[inline]
pub fn json_string(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extract a number from JSON value by key. Numeric strings do not count.
#[inline]
pub fn json_f64(value: &serde_json::Value, key: &str) -> Option<f64> {
    value.get(key)?.as_f64()
}

// =============================================================================
// String Utilities
// =============================================================================

/// First `max_chars` characters of `s`, with an ellipsis when cut.
/// Used to keep user text short in log lines.
pub fn preview(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

// =============================================================================
// Type Parsing
// =============================================================================

/// Trait for parsing strings into enum types with a default fallback.
/// Used for database values where invalid strings should fall back gracefully.
pub trait ParseWithDefault: Sized {
    /// The name of this type for logging purposes.
    fn type_name() -> &'static str;

    /// The default value to use when parsing fails.
    fn default_value() -> Self;

    /// Try to parse the string, returning None if invalid.
    fn try_parse(s: &str) -> Option<Self>;

    /// Parse a string into this type, returning a default value if parsing fails.
    fn parse_or_default(s: &str) -> Self {
        match Self::try_parse(s) {
            Some(v) => v,
            None => {
                tracing::warn!("Invalid {} value '{}', using default", Self::type_name(), s);
                Self::default_value()
            }
        }
    }
}

impl ParseWithDefault for RequestKind {
    fn type_name() -> &'static str {
        "RequestKind"
    }

    fn default_value() -> Self {
        RequestKind::Text
    }

    fn try_parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

// =============================================================================
// Logging Helpers
// =============================================================================

/// Convert a Result into an Option, logging the error at warn level.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}
