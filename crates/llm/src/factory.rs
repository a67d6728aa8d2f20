//! Backend selection from configuration

use std::sync::Arc;
use std::time::Duration;

use postal_assistant_config::{LlmConfig, ModelProvider};
use postal_assistant_core::LanguageModel;

use crate::{
    backend::{OpenAIBackend, OpenAIConfig},
    ollama::{OllamaBackend, OllamaConfig},
    LlmError,
};

/// Build the chat model described by `config`
pub fn create_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, LlmError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let model: Arc<dyn LanguageModel> = match config.provider {
        ModelProvider::OpenAi => Arc::new(OpenAIBackend::new(OpenAIConfig {
            endpoint: config.endpoint().to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
            organization: None,
        })?),
        ModelProvider::Ollama => Arc::new(OllamaBackend::new(OllamaConfig {
            endpoint: config.endpoint().to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
            ..Default::default()
        })?),
    };

    tracing::info!(
        provider = ?config.provider,
        model = %config.model,
        endpoint = %config.endpoint(),
        "Created language model"
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_key_for_remote() {
        let config = LlmConfig {
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(
            create_language_model(&config),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_ollama_selected() {
        let config = LlmConfig {
            provider: ModelProvider::Ollama,
            model: "qwen2.5:7b".to_string(),
            ..Default::default()
        };
        let model = create_language_model(&config).unwrap();
        assert_eq!(model.model_name(), "qwen2.5:7b");
    }

    #[test]
    fn test_local_openai_without_key() {
        let config = LlmConfig {
            endpoint: Some("http://localhost:8000/v1".to_string()),
            api_key: None,
            ..Default::default()
        };
        assert!(create_language_model(&config).is_ok());
    }
}
