use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openrouter;
use tracing::debug;

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::prompt::ModelRequest;

/// Generation parameters fixed per invoker instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    /// 0.0–2.0.
    pub temperature: f64,
    /// 100–8192.
    pub max_tokens: u64,
}

/// The single outbound channel to the language model.
///
/// One call per pipeline run, no internal retries, no internal timeout;
/// retry and timeout policy belong to the caller. Transport and
/// authentication failures surface as `ModelUnavailable`.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn send(&self, request: &ModelRequest) -> Result<String>;
}

/// Production backend over the OpenRouter completion API.
///
/// Holds the authenticated client and a fixed `GenerationConfig`; the
/// per-request agent is cheap to build, the client is what we avoid
/// recreating. Read-only after construction, safe to share across
/// concurrent runs.
pub struct OpenRouterInvoker {
    client: openrouter::Client,
    config: GenerationConfig,
}

impl OpenRouterInvoker {
    pub fn new(api_key: &str, config: GenerationConfig) -> Self {
        OpenRouterInvoker {
            client: openrouter::Client::new(api_key),
            config,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

#[async_trait]
impl ModelBackend for OpenRouterInvoker {
    async fn send(&self, request: &ModelRequest) -> Result<String> {
        debug!(model = %self.config.model, "Dispatching model request");

        let agent = self
            .client
            .agent(&self.config.model)
            .preamble(&request.system_instruction)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build();

        agent
            .prompt(request.user_message.as_str())
            .await
            .map_err(|e| PipelineError::ModelUnavailable(e.to_string()))
    }
}

static INVOKERS: OnceLock<Mutex<Vec<(GenerationConfig, Arc<OpenRouterInvoker>)>>> =
    OnceLock::new();

/// Lazily-initialized process-wide invoker handle, constructed once per
/// distinct configuration and reused across requests. The registry stays
/// tiny (one text and one vision configuration in practice), so a linear
/// scan under the lock is fine.
pub fn invoker_for(api_key: &str, config: GenerationConfig) -> Arc<OpenRouterInvoker> {
    let registry = INVOKERS.get_or_init(|| Mutex::new(Vec::new()));
    let mut invokers = registry.lock().unwrap();

    if let Some((_, handle)) = invokers.iter().find(|(existing, _)| *existing == config) {
        return handle.clone();
    }

    let handle = Arc::new(OpenRouterInvoker::new(api_key, config.clone()));
    invokers.push((config, handle.clone()));
    handle
}

/// Text reasoning invoker (chat and analysis).
pub fn text_invoker(settings: &Settings) -> Arc<OpenRouterInvoker> {
    invoker_for(&settings.api_key, settings.text_generation())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(model: &str, temperature: f64) -> Settings {
        Settings {
            api_key: "test-key".to_string(),
            model: model.to_string(),
            vision_model: model.to_string(),
            temperature,
            max_tokens: 2048,
        }
    }

    #[test]
    fn same_configuration_reuses_the_handle() {
        let s = settings("reuse-model", 0.7);
        let first = text_invoker(&s);
        let second = text_invoker(&s);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn distinct_configurations_get_distinct_handles() {
        let text = text_invoker(&settings("split-model", 0.7));
        let vision = invoker_for("test-key", settings("split-model", 0.7).vision_generation());
        assert!(!Arc::ptr_eq(&text, &vision));
        assert_eq!(vision.config().temperature, 0.3);
        assert_eq!(text.config().temperature, 0.7);
    }
}
