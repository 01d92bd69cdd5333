//! Component (subfield) access within a single HL7 field.

/// Separator between components of a field.
pub const COMPONENT_SEPARATOR: char = '^';

/// Returns the zero-based `index`-th component of `field`, or `""` when the field has fewer
/// components.
pub fn component(field: &str, index: usize) -> &str {
    field.split(COMPONENT_SEPARATOR).nth(index).unwrap_or("")
}
