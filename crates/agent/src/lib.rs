//! Conversational agent for the postal assistant
//!
//! Features:
//! - Cached conversational retrieval-QA (two-stage cache check, condensation)
//! - Tool dispatch through native function calling
//! - Per-session chat handling over a conversation store

pub mod chat;
pub mod dispatcher;
pub mod orchestrator;

pub use chat::ChatHandler;
pub use dispatcher::ToolDispatcher;
pub use orchestrator::CachedConversationalQa;

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Conversation store error: {0}")]
    Store(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<postal_assistant_llm::LlmError> for AgentError {
    fn from(err: postal_assistant_llm::LlmError) -> Self {
        AgentError::Llm(err.to_string())
    }
}

impl From<postal_assistant_core::ToolError> for AgentError {
    fn from(err: postal_assistant_core::ToolError) -> Self {
        match err.code {
            postal_assistant_core::ErrorCode::Timeout => AgentError::Timeout(err.message),
            _ => AgentError::Tool(err.to_string()),
        }
    }
}

impl From<postal_assistant_core::Error> for AgentError {
    fn from(err: postal_assistant_core::Error) -> Self {
        use postal_assistant_core::Error;
        match err {
            Error::Llm(msg) => AgentError::Llm(msg),
            Error::Embedding(msg) | Error::Rag(msg) => AgentError::Retrieval(msg),
            Error::Tool(msg) => AgentError::Tool(msg),
            Error::Persistence(msg) => AgentError::Store(msg),
            Error::Timeout(msg) => AgentError::Timeout(msg),
            Error::InvalidInput(msg) => AgentError::InvalidInput(msg),
            other => AgentError::Llm(other.to_string()),
        }
    }
}

impl From<AgentError> for postal_assistant_core::Error {
    fn from(err: AgentError) -> Self {
        use postal_assistant_core::Error;
        match err {
            AgentError::Llm(msg) => Error::Llm(msg),
            AgentError::Tool(msg) => Error::Tool(msg),
            AgentError::Retrieval(msg) => Error::Rag(msg),
            AgentError::Store(msg) => Error::Persistence(msg),
            AgentError::InvalidInput(msg) => Error::InvalidInput(msg),
            AgentError::Timeout(msg) => Error::Timeout(msg),
        }
    }
}
