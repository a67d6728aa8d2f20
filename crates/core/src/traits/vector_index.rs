use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// A vector with its text payload, ready to be upserted
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: HashMap<String, String>,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vector,
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A search hit with cosine similarity in `[-1, 1]`
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub id: String,
    pub content: String,
    pub similarity: f32,
    pub metadata: HashMap<String, String>,
}

impl VectorMatch {
    /// Cosine distance, `1 - similarity`
    pub fn distance(&self) -> f32 {
        1.0 - self.similarity
    }
}

/// Similarity index addressable by collection name
#[async_trait]
pub trait VectorIndex: Send + Sync + 'static {
    /// Create the collection if it does not exist
    async fn ensure_collection(&self, collection: &str, dimension: usize) -> Result<()>;

    /// Drop a collection and everything in it; missing collections are ignored
    async fn delete_collection(&self, collection: &str) -> Result<()>;

    /// Insert or overwrite records by id
    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<()>;

    /// Top `k` matches, most similar first.
    ///
    /// A missing collection yields no matches.
    async fn search(&self, collection: &str, vector: &[f32], k: usize) -> Result<Vec<VectorMatch>>;

    /// Number of records in a collection
    async fn count(&self, collection: &str) -> Result<u64>;
}
