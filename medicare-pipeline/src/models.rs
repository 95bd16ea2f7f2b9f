use serde::{Deserialize, Serialize};

/// Structured result of a medical record analysis.
///
/// All four fields are required; empty lists are valid, absent fields are
/// not. `deny_unknown_fields` keeps the contract strict: extra top-level
/// content in a model response is a schema violation, not something to
/// silently drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicalAnalysis {
    /// Brief overview of the medical record.
    pub summary: String,
    /// Important findings, in the order the model reported them.
    pub key_findings: Vec<String>,
    /// Health recommendations.
    pub recommendations: Vec<String>,
    /// Suggested next steps.
    pub next_steps: Vec<String>,
}

/// Result of one analysis pipeline run.
///
/// A degraded outcome carries a fallback-synthesized `MedicalAnalysis` with
/// the same shape as a genuine one; `degraded` is the out-of-band marker
/// that distinguishes the two.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub analysis: MedicalAnalysis,
    pub degraded: bool,
}
