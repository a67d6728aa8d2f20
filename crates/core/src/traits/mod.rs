//! Core traits for the postal assistant
//!
//! Every external collaborator sits behind one of these traits so that
//! backends can be swapped by configuration and replaced by mocks in tests.
//!
//! ```text
//! Language Models:
//!   - LanguageModel: text generation and tool calling
//!   - Embedder: text → vector
//!
//! Retrieval:
//!   - VectorIndex: similarity search addressable by collection
//!   - Retriever: query → ranked documents
//!   - QuestionAnswerer: question + history → answer
//!
//! Storage:
//!   - KeyValueStore: cached answers and embeddings
//!   - ConversationStore: per-session transcripts
//!
//! Tools:
//!   - Tool: function-calling tool interface
//!
//! Speech:
//!   - SpeechRecognizer / SpeechSynthesizer
//! ```

mod embedder;
mod llm;
mod qa;
mod retriever;
mod speech;
mod store;
mod tool;
mod vector_index;

pub use embedder::Embedder;
pub use llm::LanguageModel;
pub use qa::QuestionAnswerer;
pub use retriever::{Document, Retriever};
pub use speech::{AudioClip, SpeechRecognizer, SpeechSynthesizer};
pub use store::{ConversationStore, KeyValueStore};
pub use tool::{
    ContentBlock, ErrorCode, InputSchema, PropertySchema, SchemaProperty, Tool, ToolContext,
    ToolError, ToolOutput, ToolSchema,
};
pub use vector_index::{VectorIndex, VectorMatch, VectorRecord};
