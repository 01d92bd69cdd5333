//! Segment views and the segment-code → handler table.
//!
//! Field `n` of a segment is the `n`-th `|`-separated token of its line, so the segment code
//! itself is field 0. Reading past the end of a segment yields `""`.
//!
//! Recognised segments:
//!
//! | Code  | Effect on the record |
//! |-------|----------------------|
//! | `MSH` | message time (6), package identifier (9) |
//! | `PID` | patient name (5), organisation (3.3), date of birth (7), gender (8), nation (11.3) |
//! | `IVC` | practitioner (2) |
//! | `RXA` | medication when more than 6 fields, otherwise immunization |
//! | `AL1` | allergy, at least 7 fields |
//! | `DG1` | condition, at least 6 fields |
//! | `OBX` | observation, at least 13 fields |

use crate::component::{component, COMPONENT_SEPARATOR};
use crate::datetime::{DateField, DatePolicy};
use ips_types::{
    Allergy, Condition, Criticality, Gender, Immunization, IntermediateRecord, Medication,
    Observation, Patient,
};

/// Separator between fields of a segment.
pub const FIELD_SEPARATOR: char = '|';

/// Immunization system used when the vaccine code carries no coding system.
pub const UNKNOWN_SYSTEM: &str = "unknown";

const ADMINISTRATION_MEDICATION_FIELDS: usize = 7;
const ALLERGY_MIN_FIELDS: usize = 7;
const DIAGNOSIS_MIN_FIELDS: usize = 6;
const OBSERVATION_MIN_FIELDS: usize = 13;

/// A borrowed, field-split view of one message line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    fields: Vec<&'a str>,
}

#[allow(clippy::len_without_is_empty)]
impl<'a> Segment<'a> {
    pub fn parse(line: &'a str) -> Self {
        Self {
            fields: line.split(FIELD_SEPARATOR).collect(),
        }
    }

    /// The segment code (field 0).
    pub fn code(&self) -> &'a str {
        self.field(0)
    }

    /// Number of fields, counting the segment code.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> &'a str {
        self.fields.get(index).copied().unwrap_or("")
    }

    pub fn component(&self, index: usize, component_index: usize) -> &'a str {
        component(self.field(index), component_index)
    }
}

/// What a handler did with a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapOutcome {
    Applied,
    /// The segment had fewer fields than its handler requires.
    TooShort { required: usize, actual: usize },
    /// No handler is registered for the segment code.
    Unrecognised,
}

type SegmentHandler = fn(&Segment<'_>, &mut IntermediateRecord, DatePolicy) -> MapOutcome;

const HANDLERS: &[(&str, SegmentHandler)] = &[
    ("MSH", map_header),
    ("PID", map_patient),
    ("IVC", map_insurance),
    ("RXA", map_administration),
    ("AL1", map_allergy),
    ("DG1", map_diagnosis),
    ("OBX", map_observation),
];

/// Applies segments to an in-progress record.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegmentMapper {
    policy: DatePolicy,
}

impl SegmentMapper {
    pub fn new(policy: DatePolicy) -> Self {
        Self { policy }
    }

    /// Dispatch `segment` to the handler for its code.
    pub fn apply(&self, segment: &Segment<'_>, record: &mut IntermediateRecord) -> MapOutcome {
        match handler_for(segment.code()) {
            Some(handler) => handler(segment, record, self.policy),
            None => MapOutcome::Unrecognised,
        }
    }
}

fn handler_for(code: &str) -> Option<SegmentHandler> {
    HANDLERS
        .iter()
        .find(|(registered, _)| *registered == code)
        .map(|(_, handler)| *handler)
}

fn normalized_date(policy: DatePolicy, field: DateField, raw: &str) -> String {
    match policy.normalize_field(field, raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(?field, "{err}; leaving date empty");
            String::new()
        }
    }
}

fn map_header(
    segment: &Segment<'_>,
    record: &mut IntermediateRecord,
    policy: DatePolicy,
) -> MapOutcome {
    record.timestamp = normalized_date(policy, DateField::MessageTime, segment.field(6));
    record.package_id = segment.field(9).to_string();
    MapOutcome::Applied
}

fn map_patient(
    segment: &Segment<'_>,
    record: &mut IntermediateRecord,
    policy: DatePolicy,
) -> MapOutcome {
    record.patient = Patient {
        name: segment.component(5, 0).to_string(),
        given: segment.component(5, 1).to_string(),
        dob: normalized_date(policy, DateField::BirthDate, segment.field(7)),
        gender: administrative_sex(segment.field(8)),
        practitioner: std::mem::take(&mut record.patient.practitioner),
        nation: segment.component(11, 3).to_string(),
        organization: segment.component(3, 3).to_string(),
    };
    MapOutcome::Applied
}

fn map_insurance(
    segment: &Segment<'_>,
    record: &mut IntermediateRecord,
    _policy: DatePolicy,
) -> MapOutcome {
    record.patient.practitioner = segment.field(2).to_string();
    MapOutcome::Applied
}

/// `RXA` carries both drug and vaccine administrations; only the field count tells them apart.
fn map_administration(
    segment: &Segment<'_>,
    record: &mut IntermediateRecord,
    policy: DatePolicy,
) -> MapOutcome {
    let name = segment.field(5);
    let date = normalized_date(policy, DateField::Administration, segment.field(3));

    if segment.len() >= ADMINISTRATION_MEDICATION_FIELDS {
        record.medications.push(Medication {
            name: name.to_string(),
            date,
            dosage: segment.field(6).to_string(),
        });
    } else {
        let system = if name.contains(COMPONENT_SEPARATOR) {
            component(name, 1)
        } else {
            UNKNOWN_SYSTEM
        };
        record.immunizations.push(Immunization {
            name: component(name, 0).to_string(),
            system: system.to_string(),
            date,
        });
    }
    MapOutcome::Applied
}

fn map_allergy(
    segment: &Segment<'_>,
    record: &mut IntermediateRecord,
    policy: DatePolicy,
) -> MapOutcome {
    if segment.len() < ALLERGY_MIN_FIELDS {
        return MapOutcome::TooShort {
            required: ALLERGY_MIN_FIELDS,
            actual: segment.len(),
        };
    }
    record.allergies.push(Allergy {
        name: segment.component(3, 1).to_string(),
        criticality: allergy_severity(segment.field(4)),
        date: normalized_date(policy, DateField::Allergy, segment.field(6)),
    });
    MapOutcome::Applied
}

fn map_diagnosis(
    segment: &Segment<'_>,
    record: &mut IntermediateRecord,
    policy: DatePolicy,
) -> MapOutcome {
    if segment.len() < DIAGNOSIS_MIN_FIELDS {
        return MapOutcome::TooShort {
            required: DIAGNOSIS_MIN_FIELDS,
            actual: segment.len(),
        };
    }
    record.conditions.push(Condition {
        name: segment.component(3, 1).to_string(),
        date: normalized_date(policy, DateField::Diagnosis, segment.field(5)),
    });
    MapOutcome::Applied
}

fn map_observation(
    segment: &Segment<'_>,
    record: &mut IntermediateRecord,
    policy: DatePolicy,
) -> MapOutcome {
    if segment.len() < OBSERVATION_MIN_FIELDS {
        return MapOutcome::TooShort {
            required: OBSERVATION_MIN_FIELDS,
            actual: segment.len(),
        };
    }
    let value = format!("{} {}", segment.field(5), segment.field(6));
    record.observations.push(Observation {
        name: segment.component(3, 1).to_string(),
        date: normalized_date(policy, DateField::Observation, segment.field(12)),
        value: value.trim().to_string(),
    });
    MapOutcome::Applied
}

/// PID-8 administrative sex.
pub fn administrative_sex(code: &str) -> Gender {
    match code.to_ascii_lowercase().as_str() {
        "m" => Gender::Male,
        "f" => Gender::Female,
        _ => Gender::Other,
    }
}

/// AL1-4 allergy severity code.
pub fn allergy_severity(code: &str) -> Criticality {
    match code {
        "U" => Criticality::Low,
        "SV" => Criticality::High,
        "MO" => Criticality::Moderate,
        "MI" => Criticality::Mild,
        _ => Criticality::Unspecified,
    }
}
