//! Retrieval for the postal assistant
//!
//! Features:
//! - Knowledge base loading (one collection per directory, one document per file)
//! - Lexical BM25 search via Tantivy with a shared index/query analyzer
//!   and Ukrainian suffix stripping
//! - Dense vector search via Qdrant, or an in-memory index
//! - Weighted RRF ensembles per collection, round-robin merge across collections
//! - OpenAI and Ollama embedders with a key-value embedding cache
//! - Semantic completion cache (question embedding → cached answer)

pub mod completion_cache;
pub mod embedding_cache;
pub mod embeddings;
pub mod ingest;
pub mod knowledge_loader;
pub mod memory_index;
pub mod retriever;
pub mod sparse_search;
pub mod ukrainian;
pub mod vector_store;

pub use completion_cache::CompletionCache;
pub use embedding_cache::CachedEmbedder;
pub use embeddings::{create_embedder, HashingEmbedder, OllamaEmbedder, OpenAIEmbedder};
pub use ingest::{KnowledgeBase, VectorIngest};
pub use knowledge_loader::{KnowledgeCollection, KnowledgeLoader};
pub use memory_index::InMemoryVectorIndex;
pub use retriever::{
    build_retriever, EnsembleRetriever, LexicalRetriever, MergerRetriever, SemanticRetriever,
};
pub use sparse_search::{SparseConfig, SparseIndex};
pub use ukrainian::UkrainianStemmer;
pub use vector_store::QdrantVectorIndex;

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Embedding(err.to_string())
    }
}

impl From<tantivy::TantivyError> for RagError {
    fn from(err: tantivy::TantivyError) -> Self {
        RagError::Index(err.to_string())
    }
}

impl From<RagError> for postal_assistant_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Embedding(msg) => postal_assistant_core::Error::Embedding(msg),
            other => postal_assistant_core::Error::Rag(other.to_string()),
        }
    }
}
