//! Workspace-wide error type
//!
//! Each crate keeps its own `thiserror` enum and converts into [`Error`]
//! at trait boundaries, so components can be swapped behind `dyn` traits
//! without leaking backend-specific error types.

use thiserror::Error;

/// Result alias used by every core trait
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Retrieval error: {0}")]
    Rag(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure came from an upstream dependency rather than the caller
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Llm(_)
                | Error::Embedding(_)
                | Error::Rag(_)
                | Error::Persistence(_)
                | Error::Speech(_)
                | Error::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Llm("HTTP 500".to_string());
        assert_eq!(err.to_string(), "LLM error: HTTP 500");
        assert!(err.is_upstream());
        assert!(!Error::InvalidInput("empty".into()).is_upstream());
    }
}
