//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::timeouts;
use crate::{
    AgentConfig, CacheConfig, ConfigError, ConversationConfig, EmbeddingConfig, KnowledgeConfig,
    LlmConfig, PostalApiConfig, RetrievalConfig, SpeechConfig, StrategyKind, TariffConfig,
    VectorStoreConfig,
};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Staging and production require real credentials
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,

    #[serde(default)]
    pub postal_api: PostalApiConfig,

    #[serde(default)]
    pub tariff: TariffConfig,

    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Persistence configuration for ScyllaDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable ScyllaDB persistence (false = in-memory only)
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_scylla_hosts")]
    pub scylla_hosts: Vec<String>,

    #[serde(default = "default_scylla_keyspace")]
    pub keyspace: String,

    #[serde(default = "default_replication_factor")]
    pub replication_factor: u8,
}

fn default_scylla_hosts() -> Vec<String> {
    std::env::var("SCYLLA_HOSTS")
        .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
        .unwrap_or_else(|_| vec!["127.0.0.1:9042".to_string()])
}

fn default_scylla_keyspace() -> String {
    std::env::var("SCYLLA_KEYSPACE").unwrap_or_else(|_| "postal_assistant".to_string())
}

fn default_replication_factor() -> u8 {
    1
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scylla_hosts: default_scylla_hosts(),
            keyspace: default_scylla_keyspace(),
            replication_factor: default_replication_factor(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed origins; empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a session is dropped
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout() -> u64 {
    timeouts::HTTP_REQUEST_SECS
}

fn default_true() -> bool {
    true
}

fn default_max_sessions() -> usize {
    1000
}

fn default_session_ttl() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_sessions: default_max_sessions(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

/// Logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    /// Serve Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_retrieval()?;
        self.validate_cache()?;
        self.validate_conversation()?;
        self.validate_tariff()?;
        self.validate_speech()?;
        self.validate_credentials()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port cannot be 0"));
        }
        if self.server.max_sessions == 0 {
            return Err(invalid("server.max_sessions", "Must be at least 1"));
        }
        if self.server.timeout_seconds == 0 {
            return Err(invalid("server.timeout_seconds", "Must be at least 1"));
        }
        if self.server.timeout_seconds <= self.agent.question_answering_timeout_secs() {
            return Err(invalid(
                "server.timeout_seconds",
                "Must exceed the question-answering tool timeout",
            ));
        }
        Ok(())
    }

    pub(crate) fn validate_retrieval(&self) -> Result<(), ConfigError> {
        let retrieval = &self.retrieval;
        if retrieval.collections.is_empty() {
            return Err(invalid(
                "retrieval.collections",
                "At least one collection is required",
            ));
        }
        if retrieval.rrf_k < 0.0 {
            return Err(invalid("retrieval.rrf_k", "Must not be negative"));
        }

        for collection in &retrieval.collections {
            let field = format!("retrieval.collections.{}", collection.name);
            if collection.name.trim().is_empty() {
                return Err(invalid("retrieval.collections", "Collection name is empty"));
            }
            if collection.strategies.is_empty() {
                return Err(invalid(field, "At least one strategy is required"));
            }
            for strategy in &collection.strategies {
                if strategy.k == 0 {
                    return Err(invalid(field, "Strategy k must be at least 1"));
                }
                if strategy.weight <= 0.0 {
                    return Err(invalid(field, "Strategy weight must be positive"));
                }
                if let Some(threshold) = strategy.score_threshold {
                    if !(0.0..=1.0).contains(&threshold) {
                        return Err(invalid(
                            field,
                            format!("score_threshold must be between 0.0 and 1.0, got {}", threshold),
                        ));
                    }
                    if strategy.kind == StrategyKind::Lexical {
                        tracing::warn!(
                            collection = %collection.name,
                            "score_threshold has no effect on lexical strategies"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_cache(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.cache.score_threshold) {
            return Err(invalid(
                "cache.score_threshold",
                format!(
                    "Must be between 0.0 and 1.0, got {}",
                    self.cache.score_threshold
                ),
            ));
        }
        if self.cache.collection.trim().is_empty() {
            return Err(invalid("cache.collection", "Must not be empty"));
        }
        if self
            .retrieval
            .collections
            .iter()
            .any(|c| c.name == self.cache.collection)
        {
            return Err(invalid(
                "cache.collection",
                "Must differ from knowledge collections",
            ));
        }
        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        if self.conversation.chat_window == 0 {
            return Err(invalid("conversation.chat_window", "Must be at least 1"));
        }
        if self.agent.max_iterations == 0 {
            return Err(invalid("agent.max_iterations", "Must be at least 1"));
        }
        if self.agent.tool_timeout_secs == 0 {
            return Err(invalid("agent.tool_timeout_secs", "Must be at least 1"));
        }
        Ok(())
    }

    fn validate_tariff(&self) -> Result<(), ConfigError> {
        if self.tariff.volumetric_divisor <= 0.0 {
            return Err(invalid("tariff.volumetric_divisor", "Must be positive"));
        }
        if self.tariff.package_types.is_empty() {
            return Err(invalid("tariff.package_types", "At least one package type is required"));
        }
        Ok(())
    }

    fn validate_speech(&self) -> Result<(), ConfigError> {
        if self.speech.supported_languages.is_empty() {
            return Err(invalid("speech.supported_languages", "Must not be empty"));
        }
        if !self.speech.supports(&self.speech.default_language) {
            return Err(invalid(
                "speech.default_language",
                format!("'{}' is not a supported language", self.speech.default_language),
            ));
        }
        Ok(())
    }

    fn validate_credentials(&self) -> Result<(), ConfigError> {
        if !self.environment.is_strict() {
            return Ok(());
        }
        if self.postal_api.api_key.is_empty() {
            return Err(ConfigError::MissingField("postal_api.api_key".to_string()));
        }
        Ok(())
    }
}

/// Load settings from `config/default`, `config/{env}` and
/// `POSTAL_ASSISTANT__*` environment variables, in increasing priority.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("POSTAL_ASSISTANT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionConfig, StrategyConfig};

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.cache.score_threshold, 0.15);
        assert_eq!(settings.cache.collection, "questions");
        assert_eq!(settings.conversation.condense_window, 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_request_timeout_must_exceed_tool_timeouts() {
        let mut settings = Settings::default();
        assert!(settings.server.timeout_seconds > settings.agent.question_answering_timeout_secs());

        settings.server.timeout_seconds = 120;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        settings.server.timeout_seconds = 240;
        settings.agent.tool_timeout_secs = 300;
        assert!(settings.validate().is_err());

        settings.agent.tool_timeout_secs = 30;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_cache_threshold_validation() {
        let mut settings = Settings::default();
        settings.cache.score_threshold = 1.5;
        assert!(settings.validate().is_err());

        settings.cache.score_threshold = 0.2;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_retrieval_validation() {
        let mut settings = Settings::default();
        settings.retrieval.collections.push(CollectionConfig {
            name: "faq".to_string(),
            strategies: vec![],
        });
        assert!(settings.validate_retrieval().is_err());

        settings.retrieval.collections.pop();
        settings.retrieval.collections[0]
            .strategies
            .push(StrategyConfig::lexical(0));
        assert!(settings.validate_retrieval().is_err());
    }

    #[test]
    fn test_cache_collection_must_not_collide() {
        let mut settings = Settings::default();
        settings.cache.collection = "info".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_production_requires_postal_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.postal_api.api_key = String::new();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingField(_))
        ));

        settings.postal_api.api_key = "key".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_settings_without_files() {
        // No config/ directory relative to the crate: defaults apply
        let settings = load_settings(Some("nonexistent")).unwrap();
        assert_eq!(settings.speech.default_language, "uk");
    }
}
