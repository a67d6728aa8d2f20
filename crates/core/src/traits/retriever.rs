//! Retrieval traits and the document type they return

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Retrieved document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable id, shared by every index that holds this document
    pub id: String,
    /// Raw text
    pub content: String,
    /// Score assigned by the strategy that produced this result
    #[serde(default)]
    pub score: f32,
    /// Owning collection
    pub collection: String,
    /// Source identifier (file path relative to the collection)
    pub source: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        collection: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score: 0.0,
            collection: collection.into(),
            source: source.into(),
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }
}

/// Document retrieval interface
///
/// Implementations:
/// - `LexicalRetriever` - BM25 over a tantivy index
/// - `SemanticRetriever` - embedding similarity over a vector index
/// - `EnsembleRetriever` - weighted rank fusion of several strategies
/// - `MergerRetriever` - round-robin across collections
#[async_trait]
pub trait Retriever: Send + Sync + 'static {
    /// Retrieve documents for a query, best first.
    ///
    /// An empty query returns an empty list.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>>;

    /// Name for logging
    fn name(&self) -> &str;
}
