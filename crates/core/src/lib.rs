//! # IPS Core
//!
//! Core conversion logic for the HL7 v2 to IPS converter.
//!
//! This crate wires the boundary crates together:
//! - HL7 v2 text to intermediate record JSON (`hl7`)
//! - intermediate record JSON to an IPS document Bundle (`fhir`)
//! - both in sequence
//!
//! **No API concerns**: argument parsing, HTTP servers and file output belong in `ips-cli`,
//! `api-rest` and the `ips-run` binary.

pub mod config;
pub mod constants;
pub mod error;
pub mod record;

pub use config::{date_policy_from_env_value, pretty_from_env_value, CoreConfig};
pub use error::{ConversionError, ConversionResult};
pub use record::RecordJson;

use chrono::{DateTime, Utc};
use constants::{OUTPUT_EXTENSION, UNKNOWN_FILENAME_PART};
use fhir::{Bundle, IpsDocument};
use hl7::RecordParser;
use ips_types::IntermediateRecord;
use ips_uuid::{IdGenerator, RandomIdGenerator};
use std::fmt;
use std::sync::Arc;

/// The three conversions a caller can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionMode {
    /// HL7 v2 text to intermediate record JSON.
    Record,
    /// HL7 v2 text to IPS bundle JSON.
    Bundle,
    /// Intermediate record JSON to IPS bundle JSON.
    RecordToBundle,
}

impl ConversionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversionMode::Record => "record",
            ConversionMode::Bundle => "bundle",
            ConversionMode::RecordToBundle => "record-to-bundle",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`ConversionService::convert`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    /// Rendered JSON output.
    pub json: String,
    /// Filename to save `json` under, see [`suggested_filename`].
    pub suggested_filename: String,
}

/// Conversion operations configured by a [`CoreConfig`].
#[derive(Clone)]
pub struct ConversionService {
    cfg: Arc<CoreConfig>,
    ids: Arc<dyn IdGenerator>,
}

impl ConversionService {
    /// Creates a service that draws resource ids from random UUIDs.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self::with_id_generator(cfg, Arc::new(RandomIdGenerator::new()))
    }

    pub fn with_id_generator(cfg: Arc<CoreConfig>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { cfg, ids }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Parses HL7 v2 text into an intermediate record.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::EmptyInput`] if `hl7_text` is blank. Malformed content is not
    /// an error; it yields a partial record.
    pub fn record_from_hl7(&self, hl7_text: &str) -> ConversionResult<IntermediateRecord> {
        reject_blank(hl7_text)?;
        Ok(RecordParser::new(self.cfg.date_policy()).parse(hl7_text))
    }

    /// Parses intermediate record JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::EmptyInput`] if `json_text` is blank, or
    /// [`ConversionError::RecordParse`] if it does not match the record schema.
    pub fn record_from_json(&self, json_text: &str) -> ConversionResult<IntermediateRecord> {
        reject_blank(json_text)?;
        RecordJson::parse(json_text)
    }

    /// Assembles a bundle stamped with the current time.
    pub fn bundle_from_record(&self, record: &IntermediateRecord) -> Bundle {
        self.bundle_from_record_at(record, Utc::now())
    }

    pub fn bundle_from_record_at(
        &self,
        record: &IntermediateRecord,
        assembled_at: DateTime<Utc>,
    ) -> Bundle {
        IpsDocument::assemble(record, self.ids.as_ref(), assembled_at)
    }

    pub fn render_record(&self, record: &IntermediateRecord) -> ConversionResult<String> {
        RecordJson::render(record, self.cfg.pretty())
    }

    pub fn render_bundle(&self, bundle: &Bundle) -> ConversionResult<String> {
        Ok(IpsDocument::render(bundle, self.cfg.pretty())?)
    }

    /// HL7 v2 text to intermediate record JSON.
    ///
    /// # Errors
    ///
    /// Returns a `ConversionError` if the input is blank or serialisation fails.
    pub fn convert_to_record(&self, hl7_text: &str) -> ConversionResult<String> {
        Ok(self.convert(ConversionMode::Record, hl7_text)?.json)
    }

    /// Intermediate record JSON to IPS bundle JSON.
    ///
    /// # Errors
    ///
    /// Returns a `ConversionError` if:
    /// - the input is blank,
    /// - the input does not match the record schema (the failing path is reported),
    /// - serialisation fails.
    pub fn convert_record_to_bundle(&self, json_text: &str) -> ConversionResult<String> {
        Ok(self.convert(ConversionMode::RecordToBundle, json_text)?.json)
    }

    /// HL7 v2 text to IPS bundle JSON.
    ///
    /// Equivalent to [`ConversionService::convert_to_record`] followed by
    /// [`ConversionService::convert_record_to_bundle`].
    ///
    /// # Errors
    ///
    /// Returns a `ConversionError` if the input is blank or serialisation fails.
    pub fn convert_to_bundle(&self, hl7_text: &str) -> ConversionResult<String> {
        Ok(self.convert(ConversionMode::Bundle, hl7_text)?.json)
    }

    /// Runs one conversion and suggests a filename for its output.
    pub fn convert(&self, mode: ConversionMode, input: &str) -> ConversionResult<Conversion> {
        let span = tracing::info_span!("convert", mode = %mode, input_bytes = input.len());
        let _guard = span.enter();

        let record = match mode {
            ConversionMode::Record | ConversionMode::Bundle => self.record_from_hl7(input)?,
            ConversionMode::RecordToBundle => self.record_from_json(input)?,
        };

        let json = match mode {
            ConversionMode::Record => self.render_record(&record)?,
            ConversionMode::Bundle | ConversionMode::RecordToBundle => {
                let bundle = self.bundle_from_record(&record);
                tracing::info!(
                    entries = bundle.entry.len(),
                    bundle_id = %bundle.id,
                    "assembled bundle"
                );
                self.render_bundle(&bundle)?
            }
        };

        tracing::info!(output_bytes = json.len(), "conversion complete");
        Ok(Conversion {
            json,
            suggested_filename: suggested_filename(&record),
        })
    }
}

/// HL7 v2 text to intermediate record JSON with the default configuration.
pub fn convert_to_record(hl7_text: &str) -> ConversionResult<String> {
    default_service().convert_to_record(hl7_text)
}

/// Intermediate record JSON to IPS bundle JSON with the default configuration.
pub fn convert_record_to_bundle(json_text: &str) -> ConversionResult<String> {
    default_service().convert_record_to_bundle(json_text)
}

/// HL7 v2 text to IPS bundle JSON with the default configuration.
pub fn convert_to_bundle(hl7_text: &str) -> ConversionResult<String> {
    default_service().convert_to_bundle(hl7_text)
}

/// `<family name>_<packageUUID>.json`, with `Unknown` standing in for a missing part.
///
/// Characters that are unsafe in filenames are replaced with `_`.
pub fn suggested_filename(record: &IntermediateRecord) -> String {
    fn part(value: &str) -> String {
        let value = value.trim();
        if value.is_empty() {
            return UNKNOWN_FILENAME_PART.to_string();
        }
        value
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    }

    format!(
        "{}_{}.{OUTPUT_EXTENSION}",
        part(&record.patient.name),
        part(&record.package_id)
    )
}

fn default_service() -> ConversionService {
    ConversionService::new(Arc::new(CoreConfig::default()))
}

fn reject_blank(input: &str) -> ConversionResult<()> {
    if input.trim().is_empty() {
        return Err(ConversionError::EmptyInput);
    }
    Ok(())
}
