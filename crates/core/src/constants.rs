//! Constants used throughout the IPS core crate.

/// Environment variable selecting the [`hl7::DatePolicy`] (`uniform` or `legacy`).
pub const DATE_POLICY_ENV: &str = "IPS_DATE_POLICY";

/// Environment variable toggling pretty-printed JSON output.
pub const PRETTY_JSON_ENV: &str = "IPS_PRETTY_JSON";

/// Substituted into suggested filenames when the family name or package id is missing.
pub const UNKNOWN_FILENAME_PART: &str = "Unknown";

/// Extension of every file written by the front ends.
pub const OUTPUT_EXTENSION: &str = "json";
