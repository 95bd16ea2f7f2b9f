use crate::error::{PipelineError, Result};
use crate::models::MedicalAnalysis;

/// Parse a raw model response into a `MedicalAnalysis`.
///
/// Deliberately strict: no markdown fence stripping, no partial-field
/// recovery, no repair of any kind. Any leniency here would silently mask
/// prompt defects; the fallback synthesizer handles rejection. Same input
/// always yields the same output or the same error.
pub fn parse_analysis(text: &str) -> Result<MedicalAnalysis> {
    serde_json::from_str(text).map_err(|e| PipelineError::SchemaViolation(e.to_string()))
}
