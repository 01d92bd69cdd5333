#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no content provided")]
    EmptyInput,
    #[error("record schema mismatch at {path}: {source}")]
    RecordParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),

    #[error("HL7 error: {0}")]
    Hl7(#[from] hl7::Hl7Error),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

pub type ConversionResult<T> = std::result::Result<T, ConversionError>;
