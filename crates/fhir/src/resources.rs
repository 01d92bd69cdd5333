//! Typed FHIR resources emitted into an IPS document bundle.
//!
//! Each resource carries its own [`ResourceId`], and every cross-reference is built from a typed
//! id via [`Reference::to`], so wiring the graph never involves reading back previously built
//! JSON.
//!
//! Only the elements the converter populates are modelled. Empty strings coming from the record
//! are omitted from the wire rather than emitted as `""`.

use ips_uuid::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Resource kinds and references
// ============================================================================

/// The resource types that can appear in an IPS bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Composition,
    Patient,
    Practitioner,
    Organization,
    Medication,
    MedicationStatement,
    AllergyIntolerance,
    Condition,
    Observation,
    Immunization,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Composition => "Composition",
            ResourceKind::Patient => "Patient",
            ResourceKind::Practitioner => "Practitioner",
            ResourceKind::Organization => "Organization",
            ResourceKind::Medication => "Medication",
            ResourceKind::MedicationStatement => "MedicationStatement",
            ResourceKind::AllergyIntolerance => "AllergyIntolerance",
            ResourceKind::Condition => "Condition",
            ResourceKind::Observation => "Observation",
            ResourceKind::Immunization => "Immunization",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal `<ResourceType>/<id>` reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn to(kind: ResourceKind, id: &ResourceId) -> Self {
        Self {
            reference: format!("{kind}/{id}"),
            display: None,
        }
    }

    pub fn with_display(mut self, display: &str) -> Self {
        self.display = non_empty(display);
        self
    }

    /// Splits the reference into its type and id parts.
    pub fn target(&self) -> Option<(&str, &str)> {
        self.reference.split_once('/')
    }
}

// ============================================================================
// Shared data types
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default)]
    pub coding: Vec<Coding>,
}

impl CodeableConcept {
    /// A concept known only by its display text.
    pub fn display(text: &str) -> Self {
        Self {
            coding: vec![Coding {
                display: non_empty(text),
                ..Coding::default()
            }],
        }
    }

    pub fn coded(system: &str, code: &str, display: &str) -> Self {
        Self {
            coding: vec![Coding {
                system: non_empty(system),
                code: non_empty(code),
                display: non_empty(display),
            }],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// XHTML narrative block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub status: String,
    pub div: String,
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: ResourceId,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    pub gender: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: ResourceId,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: ResourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: ResourceId,
    pub code: CodeableConcept,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationStatement {
    pub id: ResourceId,
    pub medication_reference: Reference,
    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_period: Option<Period>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage: Vec<Dosage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
    pub id: ResourceId,

    #[serde(rename = "type")]
    pub allergy_type: String,

    #[serde(default)]
    pub category: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<String>,

    pub code: CodeableConcept,
    pub patient: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: ResourceId,
    pub code: CodeableConcept,
    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ResourceId,
    pub status: String,
    pub code: CodeableConcept,
    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Immunization {
    pub id: ResourceId,
    pub status: String,
    pub vaccine_code: CodeableConcept,
    pub patient: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_date_time: Option<String>,
}

pub use crate::composition::Composition;

/// Any resource that can sit in a bundle entry, tagged by `resourceType`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Composition(Composition),
    Patient(Patient),
    Practitioner(Practitioner),
    Organization(Organization),
    Medication(Medication),
    MedicationStatement(MedicationStatement),
    AllergyIntolerance(AllergyIntolerance),
    Condition(Condition),
    Observation(Observation),
    Immunization(Immunization),
}

impl Resource {
    pub fn id(&self) -> &ResourceId {
        match self {
            Resource::Composition(r) => &r.id,
            Resource::Patient(r) => &r.id,
            Resource::Practitioner(r) => &r.id,
            Resource::Organization(r) => &r.id,
            Resource::Medication(r) => &r.id,
            Resource::MedicationStatement(r) => &r.id,
            Resource::AllergyIntolerance(r) => &r.id,
            Resource::Condition(r) => &r.id,
            Resource::Observation(r) => &r.id,
            Resource::Immunization(r) => &r.id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Composition(_) => ResourceKind::Composition,
            Resource::Patient(_) => ResourceKind::Patient,
            Resource::Practitioner(_) => ResourceKind::Practitioner,
            Resource::Organization(_) => ResourceKind::Organization,
            Resource::Medication(_) => ResourceKind::Medication,
            Resource::MedicationStatement(_) => ResourceKind::MedicationStatement,
            Resource::AllergyIntolerance(_) => ResourceKind::AllergyIntolerance,
            Resource::Condition(_) => ResourceKind::Condition,
            Resource::Observation(_) => ResourceKind::Observation,
            Resource::Immunization(_) => ResourceKind::Immunization,
        }
    }

    /// Every outgoing reference held by this resource.
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Resource::Composition(c) => {
                let mut refs = vec![&c.subject];
                refs.extend(c.author.iter());
                refs.push(&c.custodian);
                refs.extend(c.section.iter().flat_map(|s| s.entry.iter()));
                refs
            }
            Resource::Patient(_)
            | Resource::Practitioner(_)
            | Resource::Organization(_)
            | Resource::Medication(_) => Vec::new(),
            Resource::MedicationStatement(m) => vec![&m.medication_reference, &m.subject],
            Resource::AllergyIntolerance(a) => vec![&a.patient],
            Resource::Condition(c) => vec![&c.subject],
            Resource::Observation(o) => vec![&o.subject],
            Resource::Immunization(i) => vec![&i.patient],
        }
    }
}

/// `Some(value)` unless `value` is empty.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
