use thiserror::Error;

/// Failure taxonomy of the analysis pipeline.
///
/// Only `UnsupportedLanguage` and `ModelUnavailable` cross the pipeline
/// boundary as errors. `SchemaViolation` is recoverable: `Pipeline::run_analysis`
/// converts it into a degraded (but schema-valid) outcome before returning.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The requested language tag is not part of the supported set.
    /// Rejected before any model invocation takes place.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Transport or authentication failure on the outbound model channel.
    /// Fatal for the run; never silently degraded.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model response is not well-formed structured data matching the
    /// analysis schema.
    #[error("Response violates analysis schema: {0}")]
    SchemaViolation(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
