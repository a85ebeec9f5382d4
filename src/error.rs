use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("no performance records to analyze")]
    EmptyInput,

    #[error("insufficient data: {records} records cannot form {k} clusters")]
    InsufficientData { records: usize, k: usize },

    #[error("record {index} has a missing or non-numeric {feature}")]
    MissingOrInvalidFeature { index: usize, feature: &'static str },

    #[error("cannot label {clusters} clusters with only {available} persona templates")]
    LabelExhaustion { clusters: usize, available: usize },

    #[error("invalid cluster range {min}..={max} (need 2 <= min <= max)")]
    InvalidClusterRange { min: usize, max: usize },

    #[error("CSV is missing required column: {0}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PersonaError>;
