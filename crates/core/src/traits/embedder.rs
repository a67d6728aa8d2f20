use crate::Result;
use async_trait::async_trait;

/// Text embedding model
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Embed a single query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of documents, preserving input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output vector dimension
    fn dimension(&self) -> usize;

    /// Model identifier, also used to namespace cached vectors
    fn model_name(&self) -> &str;
}
