//! Configuration management for the postal assistant
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`POSTAL_ASSISTANT__` prefix, `__` separator)
//!
//! Every section has defaults, so an empty configuration yields a working
//! development setup backed by in-memory stores.

pub mod agent;
pub mod constants;
pub mod models;
pub mod retrieval;
pub mod settings;
pub mod speech;

pub use agent::{AgentConfig, ConversationConfig, PackageTariff, PostalApiConfig, TariffConfig};
pub use models::{EmbeddingConfig, LlmConfig, ModelProvider};
pub use retrieval::{
    CacheConfig, CollectionConfig, KnowledgeConfig, RetrievalConfig, StrategyConfig,
    StrategyKind, VectorStoreBackend, VectorStoreConfig,
};
pub use settings::{
    load_settings, ObservabilityConfig, PersistenceConfig, RuntimeEnvironment, ServerConfig,
    Settings,
};
pub use speech::{SpeechConfig, SpeechServiceConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}

impl From<ConfigError> for postal_assistant_core::Error {
    fn from(err: ConfigError) -> Self {
        postal_assistant_core::Error::Config(err.to_string())
    }
}
