//! Language and embedding model configuration

use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, timeouts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// OpenAI or any API-compatible server
    #[default]
    OpenAi,
    /// Local Ollama
    Ollama,
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ModelProvider,

    /// Base URL; provider default when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key (falls back to OPENAI_API_KEY)
    #[serde(default = "default_openai_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(match self.provider {
                ModelProvider::OpenAi => endpoints::OPENAI_DEFAULT,
                ModelProvider::Ollama => endpoints::OLLAMA_DEFAULT,
            })
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::OpenAi,
            endpoint: None,
            api_key: default_openai_key(),
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ModelProvider,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_openai_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector size produced by the model
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Texts sent per request during ingestion
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Cache vectors in the key-value store
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or(match self.provider {
                ModelProvider::OpenAi => endpoints::OPENAI_DEFAULT,
                ModelProvider::Ollama => endpoints::OLLAMA_DEFAULT,
            })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::OpenAi,
            endpoint: None,
            api_key: default_openai_key(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            cache_enabled: true,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_openai_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_llm_timeout() -> u64 {
    timeouts::LLM_REQUEST_SECS
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_batch_size() -> usize {
    64
}

fn default_embedding_timeout() -> u64 {
    timeouts::EMBEDDING_SECS
}

fn default_true() -> bool {
    true
}
