//! Centralized constants for the postal assistant
//!
//! Single source of truth for default endpoints, thresholds and windows.
//! Settings fall back to these values when a field is not configured.

/// Service endpoints
pub mod endpoints {
    /// OpenAI API endpoint
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Ollama endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// Qdrant vector store endpoint
    pub const QDRANT_DEFAULT: &str = "http://127.0.0.1:6334";

    /// Nova Poshta JSON API
    pub const NOVA_POSHTA_API: &str = "https://api.novaposhta.ua/v2.0/json/";

    /// STT microservice as seen by the chat server
    pub const STT_SERVICE_DEFAULT: &str = "http://localhost:8890";

    /// TTS microservice as seen by the chat server
    pub const TTS_SERVICE_DEFAULT: &str = "http://localhost:8889";

    /// Upstream ASR inference server used by the STT service
    pub const ASR_ENGINE_DEFAULT: &str = "http://localhost:9000";

    /// Upstream synthesis server used by the TTS service
    pub const TTS_ENGINE_DEFAULT: &str = "http://localhost:5002/api/tts";
}

/// Timeouts (seconds)
pub mod timeouts {
    pub const LLM_REQUEST_SECS: u64 = 60;
    pub const EMBEDDING_SECS: u64 = 30;
    pub const POSTAL_API_SECS: u64 = 15;
    pub const TOOL_DEFAULT_SECS: u64 = 30;
    /// Two model calls plus retrieval
    pub const QUESTION_ANSWERING_SECS: u64 = 150;
    pub const SPEECH_SECS: u64 = 60;
    /// Must exceed `QUESTION_ANSWERING_SECS` so tool timeouts surface first
    pub const HTTP_REQUEST_SECS: u64 = 240;
}

/// Completion cache
pub mod cache {
    /// Maximum cosine distance for a semantic hit (exclusive)
    pub const SCORE_THRESHOLD: f32 = 0.15;

    /// Vector collection holding cached questions
    pub const QUESTIONS_COLLECTION: &str = "questions";

    /// Key-value namespace for cached answers
    pub const ANSWER_NAMESPACE: &str = "completion";

    /// Key-value namespace prefix for cached embeddings
    pub const EMBEDDING_NAMESPACE: &str = "embedding";
}

/// Retrieval ensemble
pub mod retrieval {
    /// Reciprocal rank fusion constant
    pub const RRF_K: f32 = 60.0;

    /// Similarity floor for semantic strategies
    pub const SCORE_THRESHOLD: f32 = 0.35;

    /// Tokens longer than this are dropped by the lexical analyzer
    pub const MAX_TOKEN_LENGTH: usize = 100;

    /// Lexical analyzer stemmer; the knowledge base is Ukrainian
    pub const STEMMER: &str = "ukrainian";

    pub const INFO_COLLECTION: &str = "info";
    pub const LINKS_COLLECTION: &str = "links";
}

/// Conversation windows, counted in exchanges (one human and one AI turn)
pub mod conversation {
    /// History consulted when condensing a follow-up question
    pub const CONDENSE_WINDOW: usize = 2;

    /// History handed to the agent on each chat message
    pub const CHAT_WINDOW: usize = 4;

    /// Upper bound on model/tool round trips per message
    pub const MAX_AGENT_ITERATIONS: usize = 3;

    /// Transcript retention in the persistent store
    pub const TRANSCRIPT_TTL_SECS: u64 = 86_400;
}

/// Speech services
pub mod speech {
    pub const STT_PORT: u16 = 8890;
    pub const TTS_PORT: u16 = 8889;
    pub const DEFAULT_LANGUAGE: &str = "uk";
    pub const SUPPORTED_LANGUAGES: &[&str] = &["uk", "en"];
    pub const SAMPLE_RATE: u32 = 16_000;
    pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
}

/// Delivery tariff defaults (UAH)
pub mod tariff {
    pub const BASE_FEE: f64 = 60.0;
    pub const PER_KG: f64 = 12.0;
    pub const DECLARED_VALUE_RATE: f64 = 0.005;
    /// cm³ per volumetric kilogram
    pub const VOLUMETRIC_DIVISOR: f64 = 4000.0;
}
