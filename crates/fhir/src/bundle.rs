//! IPS document bundle assembly and rendering.
//!
//! Entry order is a wire contract for consumers that index entries positionally:
//!
//! 1. Composition
//! 2. Patient
//! 3. every MedicationStatement, then every Medication
//! 4. every AllergyIntolerance, Condition, Observation and Immunization (grouped by type)
//! 5. Practitioner, then Organization
//!
//! Within each group, resources follow the order of the source collection on the record.
//!
//! Group 5 sits outside the fixed concatenation consumers index into: Practitioner and
//! Organization are appended only so that Composition `author` and `custodian` resolve.

use crate::composition::{
    Composition, Section, SectionItem, SectionKind, LOINC_SYSTEM, PATIENT_SUMMARY_CODE,
    PATIENT_SUMMARY_DISPLAY,
};
use crate::resources::{
    non_empty, Address, AllergyIntolerance, CodeableConcept, Coding, Condition, Dosage,
    HumanName, Immunization, Medication, MedicationStatement, Observation, Organization, Patient,
    Period, Practitioner, Reference, Resource, ResourceKind,
};
use crate::{FhirError, FhirResult};
use chrono::{DateTime, NaiveDate, Utc};
use ips_types::{Gender, IntermediateRecord};
use ips_uuid::{IdGenerator, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Layout of assembly-time timestamps (matches the record's canonical dates).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// FHIR `date` layout used for `Patient.birthDate`.
const FHIR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Bare HL7 date, as found in records stored before date normalization.
const HL7_DATE_FORMAT: &str = "%Y%m%d";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    pub id: String,

    #[serde(rename = "type")]
    pub bundle_type: String,

    pub timestamp: String,

    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: Resource,
}

impl BundleEntry {
    pub fn new(resource: Resource) -> Self {
        Self {
            full_url: resource.id().urn(),
            resource,
        }
    }
}

impl Bundle {
    /// References whose target is not an entry of this bundle with a matching type.
    ///
    /// An empty result means the bundle is referentially closed.
    pub fn unresolved_references(&self) -> Vec<String> {
        let mut targets: HashMap<String, Vec<ResourceKind>> = HashMap::new();
        for entry in &self.entry {
            targets
                .entry(entry.resource.id().to_string())
                .or_default()
                .push(entry.resource.kind());
        }

        self.entry
            .iter()
            .flat_map(|entry| entry.resource.references())
            .filter(|reference| {
                let resolved = reference.target().is_some_and(|(kind, id)| {
                    targets
                        .get(id)
                        .is_some_and(|kinds| kinds.len() == 1 && kinds[0].as_str() == kind)
                });
                !resolved
            })
            .map(|reference| reference.reference.clone())
            .collect()
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// IPS document operations.
///
/// This is a zero-sized type used for namespacing document-related operations.
/// All methods are associated functions.
pub struct IpsDocument;

impl IpsDocument {
    /// Assemble a document bundle from an intermediate record.
    ///
    /// Every resource receives a fresh identifier from `ids`. `assembled_at` becomes the
    /// composition date, and the bundle timestamp when the record carries none.
    pub fn assemble(
        record: &IntermediateRecord,
        ids: &dyn IdGenerator,
        assembled_at: DateTime<Utc>,
    ) -> Bundle {
        let composition_id = ids.next_id();
        let patient_id = ids.next_id();
        let practitioner_id = ids.next_id();
        let organization_id = ids.next_id();

        let subject = || Reference::to(ResourceKind::Patient, &patient_id);

        let mut medications = Vec::with_capacity(record.medications.len());
        let mut statements = Vec::with_capacity(record.medications.len());
        let mut medication_items = Vec::with_capacity(record.medications.len());
        for med in &record.medications {
            let medication = Medication {
                id: ids.next_id(),
                code: CodeableConcept::display(&med.name),
            };
            let statement = MedicationStatement {
                id: ids.next_id(),
                medication_reference: Reference::to(ResourceKind::Medication, &medication.id)
                    .with_display(&med.name),
                subject: subject(),
                effective_period: non_empty(&med.date).map(|start| Period { start: Some(start) }),
                dosage: non_empty(&med.dosage)
                    .map(|text| vec![Dosage { text: Some(text) }])
                    .unwrap_or_default(),
            };
            medication_items.push(SectionItem {
                reference: Reference::to(ResourceKind::MedicationStatement, &statement.id),
                summary: summary(&med.name, &med.dosage),
            });
            medications.push(Resource::Medication(medication));
            statements.push(Resource::MedicationStatement(statement));
        }

        let (allergies, allergy_items) = build_group(&record.allergies, |allergy| {
            let resource = AllergyIntolerance {
                id: ids.next_id(),
                allergy_type: "allergy".to_string(),
                category: vec!["medication".to_string()],
                criticality: allergy.criticality.as_str().map(str::to_string),
                code: CodeableConcept::display(&allergy.name),
                patient: subject(),
                onset_date_time: non_empty(&allergy.date),
            };
            let item = SectionItem {
                reference: Reference::to(ResourceKind::AllergyIntolerance, &resource.id),
                summary: summary(&allergy.name, allergy.criticality.as_str().unwrap_or("")),
            };
            (Resource::AllergyIntolerance(resource), item)
        });

        let (conditions, condition_items) = build_group(&record.conditions, |condition| {
            let resource = Condition {
                id: ids.next_id(),
                code: CodeableConcept::display(&condition.name),
                subject: subject(),
                onset_date_time: non_empty(&condition.date),
            };
            let item = SectionItem {
                reference: Reference::to(ResourceKind::Condition, &resource.id),
                summary: condition.name.clone(),
            };
            (Resource::Condition(resource), item)
        });

        let (observations, observation_items) =
            build_group(&record.observations, |observation| {
                let resource = Observation {
                    id: ids.next_id(),
                    status: "final".to_string(),
                    code: CodeableConcept::display(&observation.name),
                    subject: subject(),
                    effective_date_time: non_empty(&observation.date),
                    value_string: non_empty(&observation.value),
                };
                let item = SectionItem {
                    reference: Reference::to(ResourceKind::Observation, &resource.id),
                    summary: if observation.value.is_empty() {
                        observation.name.clone()
                    } else {
                        format!("{}: {}", observation.name, observation.value)
                    },
                };
                (Resource::Observation(resource), item)
            });

        let (immunizations, immunization_items) =
            build_group(&record.immunizations, |immunization| {
                let resource = Immunization {
                    id: ids.next_id(),
                    status: "completed".to_string(),
                    vaccine_code: CodeableConcept {
                        coding: vec![Coding {
                            system: non_empty(&immunization.system),
                            code: non_empty(&immunization.name),
                            display: None,
                        }],
                    },
                    patient: subject(),
                    occurrence_date_time: non_empty(&immunization.date),
                };
                let item = SectionItem {
                    reference: Reference::to(ResourceKind::Immunization, &resource.id),
                    summary: immunization.name.clone(),
                };
                (Resource::Immunization(resource), item)
            });

        let date = assembled_at.format(TIMESTAMP_FORMAT).to_string();
        let composition = Composition {
            id: composition_id,
            status: "final".to_string(),
            composition_type: CodeableConcept::coded(
                LOINC_SYSTEM,
                PATIENT_SUMMARY_CODE,
                PATIENT_SUMMARY_DISPLAY,
            ),
            subject: subject(),
            title: format!("Patient Summary as of {date}"),
            date: date.clone(),
            author: vec![Reference::to(ResourceKind::Practitioner, &practitioner_id)],
            custodian: Reference::to(ResourceKind::Organization, &organization_id),
            section: vec![
                Section::build(SectionKind::Medications, medication_items),
                Section::build(SectionKind::Allergies, allergy_items),
                Section::build(SectionKind::Conditions, condition_items),
                Section::build(SectionKind::Observations, observation_items),
                Section::build(SectionKind::Immunizations, immunization_items),
            ],
        };

        let patient = patient_resource(record, patient_id);
        let practitioner = Practitioner {
            id: practitioner_id,
            name: non_empty(&record.patient.practitioner)
                .map(|text| {
                    vec![HumanName {
                        text: Some(text),
                        ..HumanName::default()
                    }]
                })
                .unwrap_or_default(),
        };
        let organization = Organization {
            id: organization_id,
            name: non_empty(&record.patient.organization),
        };

        let mut entry = Vec::with_capacity(
            4 + statements.len()
                + medications.len()
                + allergies.len()
                + conditions.len()
                + observations.len()
                + immunizations.len(),
        );
        entry.push(Resource::Composition(composition));
        entry.push(Resource::Patient(patient));
        entry.extend(statements);
        entry.extend(medications);
        entry.extend(allergies);
        entry.extend(conditions);
        entry.extend(observations);
        entry.extend(immunizations);
        entry.push(Resource::Practitioner(practitioner));
        entry.push(Resource::Organization(organization));

        let bundle_id = if record.package_id.is_empty() {
            ids.next_id().to_string()
        } else {
            record.package_id.clone()
        };
        let timestamp = if record.timestamp.is_empty() {
            date
        } else {
            record.timestamp.clone()
        };

        tracing::debug!(entries = entry.len(), bundle_id = %bundle_id, "assembled IPS bundle");

        Bundle {
            resource_type: "Bundle".to_string(),
            id: bundle_id,
            bundle_type: "document".to_string(),
            timestamp,
            entry: entry.into_iter().map(BundleEntry::new).collect(),
        }
    }

    /// Render a bundle as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render(bundle: &Bundle, pretty: bool) -> FhirResult<String> {
        let rendered = if pretty {
            serde_json::to_string_pretty(bundle)
        } else {
            serde_json::to_string(bundle)
        };
        rendered.map_err(|e| FhirError::Translation(format!("Failed to serialise bundle: {e}")))
    }
}

fn build_group<T, F>(items: &[T], build: F) -> (Vec<Resource>, Vec<SectionItem>)
where
    F: FnMut(&T) -> (Resource, SectionItem),
{
    items.iter().map(build).unzip()
}

fn summary(name: &str, detail: &str) -> String {
    if detail.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({detail})")
    }
}

fn patient_resource(record: &IntermediateRecord, id: ResourceId) -> Patient {
    let source = &record.patient;

    let name = if source.name.is_empty() && source.given.is_empty() {
        Vec::new()
    } else {
        vec![HumanName {
            text: None,
            family: non_empty(&source.name),
            given: non_empty(&source.given).into_iter().collect(),
        }]
    };

    let birth_date = birth_date(&source.dob);
    if birth_date.is_none() && !source.dob.is_empty() {
        tracing::debug!(dob = %source.dob, "omitting unparseable birthDate");
    }

    Patient {
        id,
        name,
        gender: administrative_gender(source.gender).to_string(),
        birth_date,
        address: non_empty(&source.nation)
            .map(|country| {
                vec![Address {
                    country: Some(country),
                }]
            })
            .unwrap_or_default(),
    }
}

/// FHIR `Patient.gender`; a record without a patient segment becomes `unknown`.
fn administrative_gender(gender: Gender) -> &'static str {
    match gender {
        Gender::Unspecified => "unknown",
        other => other.as_str(),
    }
}

/// The FHIR `date` part of a record `dob`.
///
/// Accepts the canonical timestamp (its date prefix) or a bare `YYYYMMDD` date. Anything else
/// yields `None` rather than a malformed date.
fn birth_date(dob: &str) -> Option<String> {
    let dob = dob.trim();
    let parsed = dob
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, FHIR_DATE_FORMAT).ok())
        .or_else(|| NaiveDate::parse_from_str(dob, HL7_DATE_FORMAT).ok())?;
    Some(parsed.format(FHIR_DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ips_types::{
        Allergy, Condition as RecordCondition, Criticality, Gender,
        Immunization as RecordImmunization, Medication as RecordMedication,
        Observation as RecordObservation, Patient as RecordPatient,
    };
    use ips_uuid::RandomIdGenerator;
    use serde_json::Value;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Deterministic generator for assertions on exact ids.
    struct SequentialIds(AtomicU64);

    impl IdGenerator for SequentialIds {
        fn next_id(&self) -> ResourceId {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            ResourceId::parse(&format!("00000000-0000-4000-8000-{n:012x}")).unwrap()
        }
    }

    fn assembled_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap()
    }

    fn full_record() -> IntermediateRecord {
        IntermediateRecord {
            package_id: "ABC123".into(),
            timestamp: "2023-01-01T12:00:00.000Z".into(),
            patient: RecordPatient {
                name: "Doe".into(),
                given: "John".into(),
                dob: "1980-01-01T00:00:00.000Z".into(),
                gender: Gender::Male,
                practitioner: "Dr Who".into(),
                nation: "NZ".into(),
                organization: "Good Health".into(),
            },
            medications: vec![
                RecordMedication {
                    name: "Aspirin".into(),
                    date: "2023-01-01T12:00:00.000Z".into(),
                    dosage: "10mg".into(),
                },
                RecordMedication {
                    name: "Paracetamol".into(),
                    date: String::new(),
                    dosage: "500mg".into(),
                },
            ],
            allergies: vec![Allergy {
                name: "Peanut".into(),
                criticality: Criticality::High,
                date: "2022-01-01T00:00:00.000Z".into(),
            }],
            conditions: vec![RecordCondition {
                name: "Asthma".into(),
                date: "2020-05-01T00:00:00.000Z".into(),
            }],
            observations: vec![RecordObservation {
                name: "Weight".into(),
                date: "2023-01-01T00:00:00.000Z".into(),
                value: "70 kg".into(),
            }],
            immunizations: vec![RecordImmunization {
                name: "MMR".into(),
                system: "unknown".into(),
                date: String::new(),
            }],
        }
    }

    fn kinds(bundle: &Bundle) -> Vec<ResourceKind> {
        bundle.entry.iter().map(|e| e.resource.kind()).collect()
    }

    #[test]
    fn entries_follow_the_positional_contract() {
        let bundle =
            IpsDocument::assemble(&full_record(), &RandomIdGenerator::new(), assembled_at());

        assert_eq!(
            kinds(&bundle),
            vec![
                ResourceKind::Composition,
                ResourceKind::Patient,
                ResourceKind::MedicationStatement,
                ResourceKind::MedicationStatement,
                ResourceKind::Medication,
                ResourceKind::Medication,
                ResourceKind::AllergyIntolerance,
                ResourceKind::Condition,
                ResourceKind::Observation,
                ResourceKind::Immunization,
                ResourceKind::Practitioner,
                ResourceKind::Organization,
            ]
        );
        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.bundle_type, "document");
        assert_eq!(bundle.id, "ABC123");
        assert_eq!(bundle.timestamp, "2023-01-01T12:00:00.000Z");
    }

    #[test]
    fn every_reference_resolves() {
        let bundle =
            IpsDocument::assemble(&full_record(), &RandomIdGenerator::new(), assembled_at());

        assert!(bundle.unresolved_references().is_empty());
    }

    #[test]
    fn unresolved_references_detects_dangling_targets() {
        let mut bundle =
            IpsDocument::assemble(&full_record(), &RandomIdGenerator::new(), assembled_at());
        bundle.entry.pop();

        let dangling = bundle.unresolved_references();
        assert_eq!(dangling.len(), 1);
        assert!(dangling[0].starts_with("Organization/"));
    }

    #[test]
    fn ids_are_unique_and_full_urls_match() {
        let bundle =
            IpsDocument::assemble(&full_record(), &RandomIdGenerator::new(), assembled_at());

        let ids: HashSet<String> = bundle
            .entry
            .iter()
            .map(|e| e.resource.id().to_string())
            .collect();
        assert_eq!(ids.len(), bundle.entry.len());
        for entry in &bundle.entry {
            assert_eq!(entry.full_url, format!("urn:uuid:{}", entry.resource.id()));
        }
    }

    #[test]
    fn medication_pairs_preserve_order_and_link_up() {
        let bundle = IpsDocument::assemble(
            &full_record(),
            &SequentialIds(AtomicU64::new(0)),
            assembled_at(),
        );

        let statements: Vec<&MedicationStatement> = bundle
            .entry
            .iter()
            .filter_map(|e| match &e.resource {
                Resource::MedicationStatement(s) => Some(s),
                _ => None,
            })
            .collect();
        let medications: Vec<&Medication> = bundle
            .entry
            .iter()
            .filter_map(|e| match &e.resource {
                Resource::Medication(m) => Some(m),
                _ => None,
            })
            .collect();

        assert_eq!(statements.len(), 2);
        for (statement, medication) in statements.iter().zip(&medications) {
            assert_eq!(
                statement.medication_reference.reference,
                format!("Medication/{}", medication.id)
            );
            assert_eq!(
                statement.medication_reference.display.as_deref(),
                medication.code.coding[0].display.as_deref()
            );
        }
        assert_eq!(
            statements[0].medication_reference.display.as_deref(),
            Some("Aspirin")
        );
        assert_eq!(statements[0].dosage[0].text.as_deref(), Some("10mg"));
        assert_eq!(
            statements[0].effective_period,
            Some(Period {
                start: Some("2023-01-01T12:00:00.000Z".into())
            })
        );
        assert_eq!(
            statements[1].medication_reference.display.as_deref(),
            Some("Paracetamol")
        );
        assert!(statements[1].effective_period.is_none());

        let Resource::Composition(composition) = &bundle.entry[0].resource else {
            panic!("first entry must be the composition");
        };
        let section_refs: Vec<String> = composition.section[0]
            .entry
            .iter()
            .map(|r| r.reference.clone())
            .collect();
        let expected: Vec<String> = statements
            .iter()
            .map(|s| format!("MedicationStatement/{}", s.id))
            .collect();
        assert_eq!(section_refs, expected);
    }

    #[test]
    fn composition_wires_patient_author_and_custodian() {
        let bundle = IpsDocument::assemble(
            &full_record(),
            &SequentialIds(AtomicU64::new(0)),
            assembled_at(),
        );

        let Resource::Composition(composition) = &bundle.entry[0].resource else {
            panic!("first entry must be the composition");
        };
        // Ids are handed out composition, patient, practitioner, organisation first.
        assert_eq!(
            composition.id.to_string(),
            "00000000-0000-4000-8000-000000000001"
        );
        assert_eq!(
            composition.subject.reference,
            "Patient/00000000-0000-4000-8000-000000000002"
        );
        assert_eq!(
            composition.author[0].reference,
            "Practitioner/00000000-0000-4000-8000-000000000003"
        );
        assert_eq!(
            composition.custodian.reference,
            "Organization/00000000-0000-4000-8000-000000000004"
        );
        assert_eq!(composition.date, "2024-02-03T04:05:06.000Z");
        assert_eq!(
            composition.title,
            "Patient Summary as of 2024-02-03T04:05:06.000Z"
        );
        assert_eq!(
            composition.composition_type.coding[0].code.as_deref(),
            Some("60591-5")
        );
        let titles: Vec<&str> = composition.section.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Medication",
                "Allergies and Intolerances",
                "Conditions",
                "Observations",
                "Immunizations"
            ]
        );
    }

    #[test]
    fn empty_record_still_has_all_sections() {
        let bundle = IpsDocument::assemble(
            &IntermediateRecord::default(),
            &RandomIdGenerator::new(),
            assembled_at(),
        );

        assert_eq!(
            kinds(&bundle),
            vec![
                ResourceKind::Composition,
                ResourceKind::Patient,
                ResourceKind::Practitioner,
                ResourceKind::Organization,
            ]
        );
        let Resource::Composition(composition) = &bundle.entry[0].resource else {
            panic!("first entry must be the composition");
        };
        assert_eq!(composition.section.len(), 5);
        assert!(composition.section.iter().all(|s| s.entry.is_empty()));
        assert!(bundle.unresolved_references().is_empty());
        // Falls back to a generated id and the assembly time.
        assert!(ResourceId::is_canonical(&bundle.id));
        assert_eq!(bundle.timestamp, "2024-02-03T04:05:06.000Z");
    }

    #[test]
    fn patient_resource_maps_demographics() {
        let bundle =
            IpsDocument::assemble(&full_record(), &RandomIdGenerator::new(), assembled_at());
        let value = serde_json::to_value(&bundle.entry[1].resource).unwrap();

        assert_eq!(value["resourceType"], "Patient");
        assert_eq!(value["name"][0]["family"], "Doe");
        assert_eq!(value["name"][0]["given"][0], "John");
        assert_eq!(value["gender"], "male");
        assert_eq!(value["birthDate"], "1980-01-01");
        assert_eq!(value["address"][0]["country"], "NZ");
    }

    #[test]
    fn missing_patient_segment_yields_unknown_fhir_gender() {
        let bundle = IpsDocument::assemble(
            &IntermediateRecord::default(),
            &RandomIdGenerator::new(),
            assembled_at(),
        );
        let value = serde_json::to_value(&bundle.entry[1].resource).unwrap();

        assert_eq!(value["gender"], "unknown");
        assert!(value.get("birthDate").is_none());
    }

    #[test]
    fn birth_date_accepts_only_real_dates() {
        assert_eq!(
            birth_date("1980-01-01T00:00:00.000Z").as_deref(),
            Some("1980-01-01")
        );
        assert_eq!(birth_date("1980-01-01T00:00:00Z").as_deref(), Some("1980-01-01"));
        assert_eq!(birth_date("19800101").as_deref(), Some("1980-01-01"));
        assert_eq!(birth_date("1980010112000"), None);
        assert_eq!(birth_date("1980-13-45T00:00:00.000Z"), None);
        assert_eq!(birth_date("not a date"), None);
        assert_eq!(birth_date(""), None);
    }

    #[test]
    fn stored_bare_dob_still_reaches_patient() {
        let mut record = full_record();
        record.patient.dob = "19800101".into();

        let bundle = IpsDocument::assemble(&record, &RandomIdGenerator::new(), assembled_at());
        let value = serde_json::to_value(&bundle.entry[1].resource).unwrap();

        assert_eq!(value["birthDate"], "1980-01-01");
    }

    #[test]
    fn clinical_resources_carry_record_fields() {
        let bundle =
            IpsDocument::assemble(&full_record(), &RandomIdGenerator::new(), assembled_at());
        let json: Value = serde_json::to_value(&bundle).unwrap();
        let entries = json["entry"].as_array().unwrap();

        let allergy = &entries[6]["resource"];
        assert_eq!(allergy["resourceType"], "AllergyIntolerance");
        assert_eq!(allergy["type"], "allergy");
        assert_eq!(allergy["category"][0], "medication");
        assert_eq!(allergy["criticality"], "high");
        assert_eq!(allergy["code"]["coding"][0]["display"], "Peanut");
        assert_eq!(allergy["onsetDateTime"], "2022-01-01T00:00:00.000Z");

        let condition = &entries[7]["resource"];
        assert_eq!(condition["onsetDateTime"], "2020-05-01T00:00:00.000Z");

        let observation = &entries[8]["resource"];
        assert_eq!(observation["valueString"], "70 kg");
        assert_eq!(observation["effectiveDateTime"], "2023-01-01T00:00:00.000Z");

        let immunization = &entries[9]["resource"];
        assert_eq!(immunization["status"], "completed");
        assert_eq!(immunization["vaccineCode"]["coding"][0]["system"], "unknown");
        assert_eq!(immunization["vaccineCode"]["coding"][0]["code"], "MMR");
        assert!(immunization.get("occurrenceDateTime").is_none());

        let practitioner = &entries[10]["resource"];
        assert_eq!(practitioner["name"][0]["text"], "Dr Who");
        let organization = &entries[11]["resource"];
        assert_eq!(organization["name"], "Good Health");
    }

    #[test]
    fn unspecified_criticality_is_omitted() {
        let mut record = full_record();
        record.allergies[0].criticality = Criticality::Unspecified;

        let bundle = IpsDocument::assemble(&record, &RandomIdGenerator::new(), assembled_at());
        let allergy = serde_json::to_value(&bundle.entry[6].resource).unwrap();

        assert!(allergy.get("criticality").is_none());
    }

    #[test]
    fn identifiers_are_not_reused_across_assemblies() {
        let record = full_record();
        let ids = RandomIdGenerator::new();
        let first = IpsDocument::assemble(&record, &ids, assembled_at());
        let second = IpsDocument::assemble(&record, &ids, assembled_at());

        let first_ids: HashSet<String> =
            first.entry.iter().map(|e| e.resource.id().to_string()).collect();
        assert!(second
            .entry
            .iter()
            .all(|e| !first_ids.contains(&e.resource.id().to_string())));
    }

    #[test]
    fn rendered_bundle_reads_back_as_the_same_graph() {
        let bundle =
            IpsDocument::assemble(&full_record(), &RandomIdGenerator::new(), assembled_at());

        let text = IpsDocument::render(&bundle, true).expect("render");
        assert!(text.starts_with("{\n  \"resourceType\": \"Bundle\""));
        let read_back: Bundle = serde_json::from_str(&text).expect("read back");
        assert_eq!(read_back, bundle);
    }
}
