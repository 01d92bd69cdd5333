//! JSON codec for the intermediate record.
//!
//! Rendering keeps the declared key order of [`IntermediateRecord`]. Parsing reports the path of
//! the first field that does not fit the schema (for example `patient.gender`).

use crate::{ConversionError, ConversionResult};
use ips_types::IntermediateRecord;

/// Intermediate record JSON operations.
///
/// This is a zero-sized type used for namespacing record codec operations.
/// All methods are associated functions.
pub struct RecordJson;

impl RecordJson {
    /// Render `record` as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Serialization`] if serialisation fails.
    pub fn render(record: &IntermediateRecord, pretty: bool) -> ConversionResult<String> {
        let rendered = if pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        };
        rendered.map_err(ConversionError::Serialization)
    }

    /// Parse intermediate record JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::RecordParse`] if the text is not JSON, or a value does not
    /// match the record schema.
    pub fn parse(json_text: &str) -> ConversionResult<IntermediateRecord> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            ConversionError::RecordParse {
                path,
                source: err.into_inner(),
            }
        })
    }
}
