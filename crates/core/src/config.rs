//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during a conversion, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::{ConversionError, ConversionResult};
use hl7::DatePolicy;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    date_policy: DatePolicy,
    pretty: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(DatePolicy::default(), true)
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(date_policy: DatePolicy, pretty: bool) -> Self {
        Self {
            date_policy,
            pretty,
        }
    }

    pub fn date_policy(&self) -> DatePolicy {
        self.date_policy
    }

    /// Whether rendered JSON is indented.
    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn with_date_policy(mut self, date_policy: DatePolicy) -> Self {
        self.date_policy = date_policy;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Parse the date policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default policy.
pub fn date_policy_from_env_value(value: Option<String>) -> ConversionResult<DatePolicy> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<DatePolicy>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse the pretty-print switch from an optional string value.
///
/// If `value` is `None` or empty/whitespace, output is pretty-printed.
pub fn pretty_from_env_value(value: Option<String>) -> ConversionResult<bool> {
    let Some(value) = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
    else {
        return Ok(true);
    };

    match value.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConversionError::InvalidInput(format!(
            "expected a boolean for pretty JSON output, got '{other}'"
        ))),
    }
}
