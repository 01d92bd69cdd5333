//! Intermediate clinical record shared by the HL7 and FHIR boundary crates.
//!
//! The record is the hand-off point between the two transforms: the HL7 parser fills it in,
//! the bundle assembler reads it. Its JSON shape is a persisted interchange format (records are
//! stored as documents by downstream systems), so every key name below is part of the contract.
//!
//! Deserialization is deliberately forgiving about *shape*: unknown keys are ignored and missing
//! or `null` collections read as empty. It is strict about *values*: `gender` and `criticality`
//! must be one of their enumerated literals.

use serde::{Deserialize, Deserializer, Serialize};

/// The canonical clinical snapshot extracted from one message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntermediateRecord {
    /// Message correlation identifier, copied verbatim from the header segment.
    #[serde(rename = "packageUUID")]
    pub package_id: String,

    /// Canonical message time, or empty if the header carried no parseable time.
    #[serde(rename = "timeStamp")]
    pub timestamp: String,

    pub patient: Patient,

    #[serde(rename = "medication", deserialize_with = "null_as_empty")]
    pub medications: Vec<Medication>,

    #[serde(deserialize_with = "null_as_empty")]
    pub allergies: Vec<Allergy>,

    #[serde(deserialize_with = "null_as_empty")]
    pub conditions: Vec<Condition>,

    #[serde(deserialize_with = "null_as_empty")]
    pub observations: Vec<Observation>,

    #[serde(deserialize_with = "null_as_empty")]
    pub immunizations: Vec<Immunization>,
}

/// Patient demographics plus the display names of the responsible practitioner and
/// organisation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patient {
    /// Family name.
    pub name: String,
    pub given: String,
    pub dob: String,
    pub gender: Gender,
    pub practitioner: String,
    pub nation: String,
    pub organization: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medication {
    pub name: String,
    pub date: String,
    pub dosage: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allergy {
    pub name: String,
    pub criticality: Criticality,
    pub date: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
    pub name: String,
    pub date: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Observation {
    pub name: String,
    pub date: String,
    /// Coded value and unit, space-joined and trimmed.
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Immunization {
    pub name: String,
    /// Coding system of the vaccine code; `"unknown"` when the message carried none.
    pub system: String,
    pub date: String,
}

/// Administrative gender.
///
/// `Unspecified` only appears when no patient segment was present and serializes as the empty
/// string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Gender {
    /// Record wire literal (`""` for [`Gender::Unspecified`]).
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unspecified => "",
        }
    }
}

/// Allergy criticality as carried on the record.
///
/// `Unspecified` serializes as the empty string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Low,
    Moderate,
    High,
    Mild,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Criticality {
    /// Wire literal, or `None` for [`Criticality::Unspecified`].
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Criticality::Low => Some("low"),
            Criticality::Moderate => Some("moderate"),
            Criticality::High => Some("high"),
            Criticality::Mild => Some("mild"),
            Criticality::Unspecified => None,
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> IntermediateRecord {
        IntermediateRecord {
            package_id: "ABC123".into(),
            timestamp: "2023-01-01T12:00:00.000Z".into(),
            patient: Patient {
                name: "Doe".into(),
                given: "John".into(),
                dob: "1980-01-01T00:00:00.000Z".into(),
                gender: Gender::Male,
                practitioner: "Dr Who".into(),
                nation: "NZ".into(),
                organization: "Good Health".into(),
            },
            medications: vec![Medication {
                name: "Aspirin".into(),
                date: "2023-01-01T12:00:00.000Z".into(),
                dosage: "10mg".into(),
            }],
            allergies: vec![Allergy {
                name: "Peanut".into(),
                criticality: Criticality::Unspecified,
                date: String::new(),
            }],
            conditions: vec![Condition {
                name: "Asthma".into(),
                date: "2020-05-01T00:00:00.000Z".into(),
            }],
            observations: vec![Observation {
                name: "Weight".into(),
                date: "2023-01-01T00:00:00.000Z".into(),
                value: "70 kg".into(),
            }],
            immunizations: vec![Immunization {
                name: "MMR".into(),
                system: "unknown".into(),
                date: String::new(),
            }],
        }
    }

    #[test]
    fn round_trips_through_json() {
        let record = sample_record();
        let text = serde_json::to_string_pretty(&record).expect("serialize");
        let back: IntermediateRecord = serde_json::from_str(&text).expect("deserialize");

        assert_eq!(record, back);
        assert_eq!(serde_json::to_string_pretty(&back).unwrap(), text);
    }

    #[test]
    fn uses_contract_key_names_in_declared_order() {
        let value = serde_json::to_value(IntermediateRecord::default()).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(
            keys,
            vec![
                "packageUUID",
                "timeStamp",
                "patient",
                "medication",
                "allergies",
                "conditions",
                "observations",
                "immunizations"
            ]
        );
    }

    #[test]
    fn empty_record_serializes_arrays_not_nulls() {
        let value = serde_json::to_value(IntermediateRecord::default()).unwrap();

        for key in ["medication", "allergies", "conditions", "observations", "immunizations"] {
            assert_eq!(value[key], json!([]), "{key} should be an empty array");
        }
    }

    #[test]
    fn null_and_missing_collections_read_as_empty() {
        let record: IntermediateRecord = serde_json::from_value(json!({
            "packageUUID": "X",
            "medication": null,
        }))
        .unwrap();

        assert_eq!(record.package_id, "X");
        assert!(record.medications.is_empty());
        assert!(record.allergies.is_empty());
        assert_eq!(record.patient, Patient::default());
    }

    #[test]
    fn ignores_unknown_keys() {
        let record: IntermediateRecord = serde_json::from_value(json!({
            "_id": "65a0c1",
            "__v": 0,
            "packageUUID": "X",
            "patient": { "name": "Doe", "extra": true }
        }))
        .unwrap();

        assert_eq!(record.patient.name, "Doe");
    }

    #[test]
    fn criticality_literals() {
        let cases = [
            (Criticality::Low, "low"),
            (Criticality::Moderate, "moderate"),
            (Criticality::High, "high"),
            (Criticality::Mild, "mild"),
            (Criticality::Unspecified, ""),
        ];
        for (criticality, literal) in cases {
            assert_eq!(serde_json::to_value(criticality).unwrap(), json!(literal));
            let back: Criticality = serde_json::from_value(json!(literal)).unwrap();
            assert_eq!(back, criticality);
        }
    }

    #[test]
    fn gender_literals() {
        let cases = [
            (Gender::Male, "male"),
            (Gender::Female, "female"),
            (Gender::Other, "other"),
            (Gender::Unspecified, ""),
        ];
        for (gender, literal) in cases {
            assert_eq!(gender.as_str(), literal);
            assert_eq!(serde_json::to_value(gender).unwrap(), json!(literal));
            let back: Gender = serde_json::from_value(json!(literal)).unwrap();
            assert_eq!(back, gender);
        }
    }

    #[test]
    fn default_record_renders_empty_gender_and_round_trips_verbatim() {
        let text = serde_json::to_string(&IntermediateRecord::default()).expect("serialize");
        assert!(text.contains("\"gender\":\"\""), "got: {text}");

        let back: IntermediateRecord = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back.patient.gender, Gender::Unspecified);
        assert_eq!(serde_json::to_string(&back).expect("serialize"), text);
    }

    #[test]
    fn rejects_unknown_as_a_record_gender() {
        assert!(serde_json::from_value::<Gender>(json!("unknown")).is_err());
    }

    #[test]
    fn rejects_unknown_gender_literal() {
        let result = serde_json::from_value::<Patient>(json!({ "gender": "M" }));
        assert!(result.is_err());
    }
}
