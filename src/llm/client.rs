use crate::types::{AppError, Result};
use crate::utils::toml_config::{AppConfig, ProviderConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Generic LLM client trait for provider abstraction
///
/// Implementations only need plain completion; the synthesizer treats every
/// error as a signal to use its deterministic summary instead.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI API provider (including compatible APIs)
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Resolve the `[llm]` section; `None` when no provider is configured.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let provider = match &config.llm {
            None => return Ok(None),
            Some(ProviderConfig::Ollama { base_url, model }) => Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            },
            Some(ProviderConfig::OpenAI {
                api_base, model, ..
            }) => Provider::OpenAI {
                api_key: config.llm_api_key()?.unwrap_or_default(),
                api_base: api_base.clone(),
                model: model.clone(),
            },
        };
        Ok(Some(provider))
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's Cargo feature is disabled.
    pub fn create_client(&self) -> Result<Arc<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaClient::new(base_url, model.clone())?,
            )),

            #[allow(unreachable_patterns)]
            other => Err(AppError::Configuration(format!(
                "{} support is not compiled in; rebuild with the '{}' feature",
                other.name(),
                other.name().to_lowercase()
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}
