//! Chat model integration
//!
//! Features:
//! - OpenAI-compatible and Ollama backends with native function calling
//! - Provider selection from configuration
//! - Prompt templates for answering, condensing and the tool agent

pub mod backend;
pub mod factory;
pub mod ollama;
pub mod prompt;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use factory::create_language_model;
pub use ollama::{OllamaBackend, OllamaConfig};
pub use prompt::{agent_request, answer_request, condense_request, format_context, PromptTemplate};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for postal_assistant_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => postal_assistant_core::Error::Timeout("LLM request".to_string()),
            other => postal_assistant_core::Error::Llm(other.to_string()),
        }
    }
}
