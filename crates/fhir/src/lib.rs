//! FHIR wire/boundary support for the IPS converter.
//!
//! This crate provides **wire models** and **assembly helpers** for International Patient
//! Summary documents:
//! - typed FHIR R4 resources, tagged by `resourceType`
//! - the IPS Composition with its five fixed sections
//! - document Bundle assembly from an [`ips_types::IntermediateRecord`]
//!
//! This crate focuses on:
//! - referential integrity of the assembled graph
//! - deterministic entry order
//! - serialisation of the bundle
//!
//! It does not validate against FHIR profiles and performs no terminology lookups.

pub mod bundle;
pub mod composition;
pub mod resources;

// Re-export facades
pub use bundle::IpsDocument;

// Re-export public wire types
pub use bundle::{Bundle, BundleEntry};
pub use composition::{Composition, Section, SectionKind};
pub use resources::{Reference, Resource, ResourceKind};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
