use crate::error::{PipelineError, Result};
use crate::invoker::GenerationConfig;

const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u64 = 2048;

/// Model settings loaded from environment variables.
///
/// `OPENROUTER_API_KEY` is required; everything else has a default. Numeric
/// values are clamped to the ranges the backend accepts rather than
/// rejected.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub vision_model: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| PipelineError::ModelUnavailable("OPENROUTER_API_KEY not set".to_string()))?;

        let model = std::env::var("MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let vision_model = std::env::var("VISION_MODEL").unwrap_or_else(|_| model.clone());

        let temperature = std::env::var("TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE)
            .clamp(0.0, 2.0);

        let max_tokens = std::env::var("MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS)
            .clamp(100, 8192);

        Ok(Settings {
            api_key,
            model,
            vision_model,
            temperature,
            max_tokens,
        })
    }

    /// Configuration of the text reasoning invoker (chat and analysis).
    pub fn text_generation(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Configuration of the vision extraction invoker. Lower temperature
    /// for consistent OCR output.
    pub fn vision_generation(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.vision_model.clone(),
            temperature: 0.3,
            max_tokens: self.max_tokens,
        }
    }
}
