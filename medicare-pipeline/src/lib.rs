pub mod config;
pub mod error;
pub mod fallback;
pub mod invoker;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompt;

// Re-export commonly used types
pub use config::Settings;
pub use error::{PipelineError, Result};
pub use fallback::synthesize_fallback;
pub use invoker::{GenerationConfig, ModelBackend, OpenRouterInvoker, invoker_for, text_invoker};
pub use models::{AnalysisOutcome, MedicalAnalysis};
pub use parser::parse_analysis;
pub use pipeline::{NO_CONTEXT_MARKER, Pipeline};
pub use prompt::{Language, ModelRequest, PromptSpec, TaskKind};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Backend stub that returns a canned response and records what it was
    /// asked to send.
    struct ScriptedBackend {
        response: String,
        calls: AtomicUsize,
        last_request: Mutex<Option<ModelRequest>>,
    }

    impl ScriptedBackend {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(ScriptedBackend {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        async fn send(&self, request: &ModelRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(self.response.clone())
        }
    }

    struct UnavailableBackend;

    #[async_trait]
    impl ModelBackend for UnavailableBackend {
        async fn send(&self, _request: &ModelRequest) -> Result<String> {
            Err(PipelineError::ModelUnavailable("connection refused".to_string()))
        }
    }

    const STRUCTURED_RESPONSE: &str = r#"{"summary": "Borderline blood pressure and glucose.", "key_findings": ["BP 140/90", "Glucose 110"], "recommendations": ["Monitor blood pressure daily"], "next_steps": ["Repeat glucose test", "Book a GP appointment"]}"#;

    #[tokio::test]
    async fn analysis_pipeline_returns_structured_result() {
        let backend = ScriptedBackend::new(STRUCTURED_RESPONSE);
        let pipeline = Pipeline::new(backend.clone());

        let outcome = pipeline
            .run_analysis("Patient BP 140/90, glucose 110", "", Language::En)
            .await
            .unwrap();

        assert!(!outcome.degraded);
        assert_eq!(outcome.analysis.summary, "Borderline blood pressure and glucose.");
        assert_eq!(outcome.analysis.key_findings, vec!["BP 140/90", "Glucose 110"]);
        assert_eq!(outcome.analysis.next_steps.len(), 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        // Empty context is replaced by the marker before rendering.
        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert!(request.user_message.contains(NO_CONTEXT_MARKER));
        assert!(request.user_message.contains("Patient BP 140/90, glucose 110"));
    }

    #[tokio::test]
    async fn analysis_pipeline_degrades_on_unstructured_prose() {
        let backend = ScriptedBackend::new("I think the patient is fine.");
        let pipeline = Pipeline::new(backend);

        let outcome = pipeline
            .run_analysis("Patient BP 140/90, glucose 110", "", Language::En)
            .await
            .unwrap();

        assert!(outcome.degraded);
        assert!(outcome.analysis.summary.contains("encountered formatting issues"));
        assert_eq!(outcome.analysis.key_findings.len(), 1);
        assert_eq!(outcome.analysis.recommendations.len(), 1);
        assert_eq!(outcome.analysis.next_steps.len(), 2);
    }

    #[tokio::test]
    async fn non_empty_context_is_passed_through() {
        let backend = ScriptedBackend::new(STRUCTURED_RESPONSE);
        let pipeline = Pipeline::new(backend.clone());

        pipeline
            .run_analysis("BP 140/90", "Patient is diabetic", Language::Fr)
            .await
            .unwrap();

        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert!(request.user_message.contains("Patient is diabetic"));
        assert!(!request.user_message.contains(NO_CONTEXT_MARKER));
    }

    #[tokio::test]
    async fn unsupported_language_is_rejected_before_invocation() {
        let backend = ScriptedBackend::new(STRUCTURED_RESPONSE);

        let err = Language::parse("de").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedLanguage(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_unavailable_surfaces_to_the_caller() {
        let pipeline = Pipeline::new(Arc::new(UnavailableBackend));

        let err = pipeline
            .run_analysis("BP 140/90", "", Language::En)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable(_)));

        let err = pipeline.run_chat("hello", Language::En).await.unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn chat_pipeline_returns_raw_response() {
        let backend = ScriptedBackend::new("Drink plenty of water and rest.");
        let pipeline = Pipeline::new(backend.clone());

        let response = pipeline
            .run_chat("What helps with a mild fever?", Language::En)
            .await
            .unwrap();

        assert_eq!(response, "Drink plenty of water and rest.");
        let request = backend.last_request.lock().unwrap().clone().unwrap();
        assert!(request.user_message.contains("What helps with a mild fever?"));
        assert!(request.system_instruction.contains("MediCare AI"));
    }

    #[tokio::test]
    async fn degraded_summary_embeds_truncated_reason() {
        // A response whose parse error message we can't predict exactly, but
        // whatever it is, the embedded diagnostic stays within 200 chars.
        let backend = ScriptedBackend::new(&format!("{{\"summary\": {}}}", "1".repeat(400)));
        let pipeline = Pipeline::new(backend);

        let outcome = pipeline
            .run_analysis("BP 140/90", "", Language::En)
            .await
            .unwrap();

        assert!(outcome.degraded);
        let embedded = outcome
            .analysis
            .summary
            .strip_prefix("Analysis completed but encountered formatting issues: ")
            .unwrap();
        assert!(embedded.chars().count() <= 200);
    }
}
