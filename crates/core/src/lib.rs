//! Core traits and types for the postal assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Core traits for pluggable backends (LLM, embeddings, indexes, stores, speech)
//! - LLM request/response types
//! - Conversation transcript types
//! - Error types

pub mod conversation;
pub mod error;
pub mod ids;
pub mod llm_types;
pub mod traits;

pub use conversation::{buffer_string, recent_window, ChatTurn, TurnRole};
pub use error::{Error, Result};
pub use ids::content_uuid;
pub use llm_types::{
    FinishReason, GenerateRequest, GenerateResponse, Message, Role, TokenUsage, ToolCall,
    ToolDefinition,
};

pub use traits::{
    AudioClip, ContentBlock, ConversationStore, Document, Embedder, ErrorCode, InputSchema,
    KeyValueStore, LanguageModel, PropertySchema, QuestionAnswerer, Retriever, SchemaProperty,
    SpeechRecognizer, SpeechSynthesizer, Tool, ToolContext, ToolError, ToolOutput, ToolSchema,
    VectorIndex, VectorMatch, VectorRecord,
};
