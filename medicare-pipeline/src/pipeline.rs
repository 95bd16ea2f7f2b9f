use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::fallback::synthesize_fallback;
use crate::invoker::ModelBackend;
use crate::models::AnalysisOutcome;
use crate::parser::parse_analysis;
use crate::prompt::{Language, PromptSpec, TaskKind};

/// Marker substituted for an empty context before prompt rendering.
pub const NO_CONTEXT_MARKER: &str = "No additional context provided";

/// Composes the pipeline stages into one request→response flow.
///
/// Each run is strictly sequential: build the prompt, render the request,
/// invoke the model once, then (for analysis) parse or fall back. The only
/// shared state across runs is the backend handle, which is read-only after
/// construction.
#[derive(Clone)]
pub struct Pipeline {
    backend: Arc<dyn ModelBackend>,
}

impl Pipeline {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Pipeline { backend }
    }

    /// Chat flow: no structured parsing, the raw model response is the
    /// result.
    pub async fn run_chat(&self, message: &str, language: Language) -> Result<String> {
        info!(language = language.tag(), "Running chat pipeline");

        let spec = PromptSpec::build(TaskKind::Chat, language);
        let request = spec.render(&[("user_question", message)]);
        let response = self.backend.send(&request).await?;

        info!(chars = response.len(), "Chat pipeline completed");
        Ok(response)
    }

    /// Analysis flow: parse the response against the analysis schema and
    /// substitute a degraded record on schema violation.
    ///
    /// `ModelUnavailable` is not caught: a dead model channel is fatal for
    /// the run and must surface to the caller, unlike a parse failure.
    pub async fn run_analysis(
        &self,
        subject_text: &str,
        context_text: &str,
        language: Language,
    ) -> Result<AnalysisOutcome> {
        info!(language = language.tag(), "Running analysis pipeline");

        let spec = PromptSpec::build(TaskKind::Analysis, language);
        let context = if context_text.is_empty() {
            NO_CONTEXT_MARKER
        } else {
            context_text
        };
        let request = spec.render(&[("medical_text", subject_text), ("context", context)]);

        let raw = self.backend.send(&request).await?;

        match parse_analysis(&raw) {
            Ok(analysis) => {
                info!("Analysis pipeline completed with structured result");
                Ok(AnalysisOutcome {
                    analysis,
                    degraded: false,
                })
            }
            Err(PipelineError::SchemaViolation(reason)) => {
                warn!(reason = %reason, "Model response rejected, synthesizing fallback");
                Ok(AnalysisOutcome {
                    analysis: synthesize_fallback(&reason),
                    degraded: true,
                })
            }
            Err(other) => Err(other),
        }
    }
}
