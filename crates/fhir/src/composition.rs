//! IPS Composition and its fixed sections.
//!
//! The five sections below are always emitted, in this order, whether or not they have entries.
//! Titles, LOINC codes and displays are literal wire values relied on by downstream consumers.

use crate::resources::{CodeableConcept, Narrative, Reference};
use ips_uuid::ResourceId;
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

pub const LOINC_SYSTEM: &str = "http://loinc.org";

/// Document type of an IPS composition.
pub const PATIENT_SUMMARY_CODE: &str = "60591-5";
pub const PATIENT_SUMMARY_DISPLAY: &str = "Patient summary Document";

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
const EMPTY_REASON_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/list-empty-reason";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub id: ResourceId,
    pub status: String,

    #[serde(rename = "type")]
    pub composition_type: CodeableConcept,

    pub subject: Reference,
    pub date: String,
    pub title: String,

    #[serde(default)]
    pub author: Vec<Reference>,

    pub custodian: Reference,

    #[serde(default)]
    pub section: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    pub code: CodeableConcept,
    pub text: Narrative,

    #[serde(default)]
    pub entry: Vec<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<CodeableConcept>,
}

/// The fixed IPS sections, in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    Medications,
    Allergies,
    Conditions,
    Observations,
    Immunizations,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Medications,
        SectionKind::Allergies,
        SectionKind::Conditions,
        SectionKind::Observations,
        SectionKind::Immunizations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKind::Medications => "Medication",
            SectionKind::Allergies => "Allergies and Intolerances",
            SectionKind::Conditions => "Conditions",
            SectionKind::Observations => "Observations",
            SectionKind::Immunizations => "Immunizations",
        }
    }

    pub fn loinc_code(self) -> &'static str {
        match self {
            SectionKind::Medications => "10160-0",
            SectionKind::Allergies => "48765-2",
            SectionKind::Conditions => "11450-4",
            SectionKind::Observations => "61150-9",
            SectionKind::Immunizations => "11369-6",
        }
    }

    pub fn loinc_display(self) -> &'static str {
        match self {
            SectionKind::Medications => "History of Medication use Narrative",
            SectionKind::Allergies => "Allergies and adverse reactions Document",
            SectionKind::Conditions => "Problem List",
            SectionKind::Observations => {
                "Vital signs, weight, length, head circumference, oxygen saturation and BMI Panel"
            }
            SectionKind::Immunizations => "Immunization Activity",
        }
    }
}

/// One row of a section: the reference placed in `entry` and the line shown in the narrative.
#[derive(Clone, Debug)]
pub struct SectionItem {
    pub reference: Reference,
    pub summary: String,
}

impl Section {
    pub fn build(kind: SectionKind, items: Vec<SectionItem>) -> Self {
        let empty_reason = items.is_empty().then(|| {
            CodeableConcept::coded(EMPTY_REASON_SYSTEM, "unavailable", "Unavailable")
        });
        let text = narrative(&items);

        Self {
            title: kind.title().to_string(),
            code: CodeableConcept::coded(LOINC_SYSTEM, kind.loinc_code(), kind.loinc_display()),
            text,
            entry: items.into_iter().map(|item| item.reference).collect(),
            empty_reason,
        }
    }
}

fn narrative(items: &[SectionItem]) -> Narrative {
    let body = if items.is_empty() {
        "<p>No information available</p>".to_string()
    } else {
        let rows: String = items
            .iter()
            .map(|item| format!("<li>{}</li>", escape(item.summary.as_str())))
            .collect();
        format!("<ul>{rows}</ul>")
    };

    Narrative {
        status: "generated".to_string(),
        div: format!("<div xmlns=\"{XHTML_NAMESPACE}\">{body}</div>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceKind;

    #[test]
    fn sections_are_in_document_order_with_literal_codes() {
        let codes: Vec<(&str, &str)> = SectionKind::ALL
            .iter()
            .map(|k| (k.title(), k.loinc_code()))
            .collect();

        assert_eq!(
            codes,
            vec![
                ("Medication", "10160-0"),
                ("Allergies and Intolerances", "48765-2"),
                ("Conditions", "11450-4"),
                ("Observations", "61150-9"),
                ("Immunizations", "11369-6"),
            ]
        );
    }

    #[test]
    fn empty_section_has_reason_and_placeholder_text() {
        let section = Section::build(SectionKind::Conditions, Vec::new());

        assert!(section.entry.is_empty());
        assert_eq!(
            section.empty_reason.unwrap().coding[0].code.as_deref(),
            Some("unavailable")
        );
        assert!(section.text.div.contains("No information available"));
    }

    #[test]
    fn narrative_escapes_markup() {
        let item = SectionItem {
            reference: Reference::to(ResourceKind::Condition, &ResourceId::new()),
            summary: "Fish & <shellfish>".into(),
        };
        let section = Section::build(SectionKind::Allergies, vec![item]);

        assert!(section.text.div.contains("<li>Fish &amp; &lt;shellfish&gt;</li>"));
        assert!(section.text.div.starts_with("<div xmlns=\"http://www.w3.org/1999/xhtml\">"));
        assert!(section.empty_reason.is_none());
        assert_eq!(section.entry.len(), 1);
    }
}
