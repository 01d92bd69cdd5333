//! Date normalisation for HL7 `DTM`/`DT` values.
//!
//! Every date that lands on the intermediate record is rendered in one canonical layout,
//! `YYYY-MM-DDThh:mm:ss.000Z`, so that nothing downstream has to parse HL7 dates again.

use crate::{Hl7Error, Hl7Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::{fmt, str::FromStr};

/// Full HL7 timestamp, `YYYYMMDDhhmmss`.
pub const HL7_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Bare HL7 date, `YYYYMMDD`.
pub const HL7_DATE_FORMAT: &str = "%Y%m%d";

/// Canonical output layout (millisecond field is always `000`).
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Layout the legacy policy uses for dates of birth.
const LEGACY_BIRTH_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Normalise a raw HL7 date, trying the full timestamp layout first and the bare date second.
///
/// # Errors
///
/// Returns [`Hl7Error::UnparseableDate`] when neither layout matches.
pub fn normalize(raw: &str) -> Hl7Result<String> {
    parse_timestamp(raw)
        .or_else(|| parse_date(raw))
        .map(|dt| dt.format(CANONICAL_FORMAT).to_string())
        .ok_or_else(|| Hl7Error::UnparseableDate(raw.to_string()))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), HL7_TIMESTAMP_FORMAT).ok()
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw.trim(), HL7_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// The record field a date is destined for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateField {
    MessageTime,
    BirthDate,
    Administration,
    Allergy,
    Diagnosis,
    Observation,
}

/// Strategy for normalising dates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DatePolicy {
    /// Long-then-short fallback for every date-bearing field.
    #[default]
    Uniform,
    /// Field-specific layouts matching older converter output: message and administration
    /// times accept only the full timestamp, dates of birth only the bare date (rendered
    /// without milliseconds), and allergy, diagnosis and observation dates are copied raw.
    Legacy,
}

impl DatePolicy {
    /// Normalise `raw` for the given destination field.
    ///
    /// # Errors
    ///
    /// Returns [`Hl7Error::UnparseableDate`] when the value does not match a layout accepted
    /// for this field under this policy.
    pub fn normalize_field(self, field: DateField, raw: &str) -> Hl7Result<String> {
        match self {
            DatePolicy::Uniform => normalize(raw),
            DatePolicy::Legacy => match field {
                DateField::MessageTime | DateField::Administration => parse_timestamp(raw)
                    .map(|dt| dt.format(CANONICAL_FORMAT).to_string())
                    .ok_or_else(|| Hl7Error::UnparseableDate(raw.to_string())),
                DateField::BirthDate => parse_date(raw)
                    .map(|dt| dt.format(LEGACY_BIRTH_DATE_FORMAT).to_string())
                    .ok_or_else(|| Hl7Error::UnparseableDate(raw.to_string())),
                DateField::Allergy | DateField::Diagnosis | DateField::Observation => {
                    Ok(raw.to_string())
                }
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DatePolicy::Uniform => "uniform",
            DatePolicy::Legacy => "legacy",
        }
    }
}

impl fmt::Display for DatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatePolicy {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" => Ok(DatePolicy::Uniform),
            "legacy" => Ok(DatePolicy::Legacy),
            _ => Err(Hl7Error::UnknownDatePolicy(s.to_string())),
        }
    }
}
