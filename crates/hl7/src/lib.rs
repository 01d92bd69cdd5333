//! HL7 v2 wire/boundary support.
//!
//! This crate translates pipe-delimited HL7 v2.x messages into the intermediate clinical record
//! defined in `ips-types`. Only a fixed subset of segments and field positions is recognised
//! (see [`segment`]); everything else in a message is ignored.
//!
//! Parsing never fails as a whole. Unparseable dates, short segments and unknown segment codes
//! are logged at `debug` level and skipped, so a malformed message yields a partial record.

pub mod component;
pub mod datetime;
pub mod parser;
pub mod segment;

pub use datetime::{normalize, DateField, DatePolicy};
pub use parser::RecordParser;
pub use segment::{MapOutcome, Segment, SegmentMapper};

use ips_types::IntermediateRecord;
use thiserror::Error;

/// Errors returned by the `hl7` boundary crate.
#[derive(Debug, Error)]
pub enum Hl7Error {
    #[error("unparseable date: '{0}'")]
    UnparseableDate(String),

    #[error("unknown date policy: '{0}' (expected 'uniform' or 'legacy')")]
    UnknownDatePolicy(String),
}

/// Type alias for Results that can fail with an [`Hl7Error`].
pub type Hl7Result<T> = Result<T, Hl7Error>;

/// Parse a complete message with the default [`DatePolicy`].
pub fn parse_message(message: &str) -> IntermediateRecord {
    RecordParser::new(DatePolicy::default()).parse(message)
}
