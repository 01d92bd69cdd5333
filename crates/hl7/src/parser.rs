//! Whole-message parsing into an [`IntermediateRecord`].

use crate::datetime::DatePolicy;
use crate::segment::{MapOutcome, Segment, SegmentMapper};
use ips_types::IntermediateRecord;

/// Segments are terminated by `\r` on the wire, but messages pasted or saved as text usually
/// use `\n` or `\r\n`. All three are accepted.
const SEGMENT_TERMINATORS: [char; 2] = ['\r', '\n'];

/// Minimum number of fields a line needs before its segment code is trusted.
const MIN_SEGMENT_FIELDS: usize = 2;

/// Drives the [`SegmentMapper`] over every line of a message.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordParser {
    mapper: SegmentMapper,
}

impl RecordParser {
    pub fn new(policy: DatePolicy) -> Self {
        Self {
            mapper: SegmentMapper::new(policy),
        }
    }

    /// Parse `message` into a fresh record.
    ///
    /// Collections on the returned record follow segment order in the message. Lines that are
    /// blank, have fewer than two fields, are too short for their handler, or carry an
    /// unrecognised code contribute nothing.
    pub fn parse(&self, message: &str) -> IntermediateRecord {
        let mut record = IntermediateRecord::default();

        for (index, line) in message.split(SEGMENT_TERMINATORS).enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let segment = Segment::parse(line);
            if segment.len() < MIN_SEGMENT_FIELDS {
                tracing::debug!(line = index + 1, "skipping line without field separators");
                continue;
            }

            match self.mapper.apply(&segment, &mut record) {
                MapOutcome::Applied => {}
                MapOutcome::TooShort { required, actual } => {
                    tracing::debug!(
                        line = index + 1,
                        code = segment.code(),
                        required,
                        actual,
                        "skipping short segment"
                    );
                }
                MapOutcome::Unrecognised => {
                    tracing::trace!(line = index + 1, code = segment.code(), "ignoring segment");
                }
            }
        }

        record
    }
}
