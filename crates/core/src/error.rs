#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed sample: {0}")]
    MalformedSample(String),

    #[error("Sample series must contain at least one sample")]
    EmptySeries,
}
