//! Process-local vector index with exact cosine search

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use postal_assistant_core::{Error, VectorIndex, VectorMatch, VectorRecord};

struct Collection {
    dimension: usize,
    /// Insertion order, so equal scores rank deterministically
    records: Vec<VectorRecord>,
}

/// In-memory [`VectorIndex`] for development and tests
#[derive(Default)]
pub struct InMemoryVectorIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> postal_assistant_core::Result<()> {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_insert_with(|| Collection {
                dimension,
                records: Vec::new(),
            });
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> postal_assistant_core::Result<()> {
        self.collections.write().remove(collection);
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> postal_assistant_core::Result<()> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| Error::Rag(format!("Collection not found: {}", collection)))?;

        for record in records {
            if record.vector.len() != target.dimension {
                return Err(Error::Rag(format!(
                    "Vector dimension {} does not match collection dimension {}",
                    record.vector.len(),
                    target.dimension
                )));
            }
            match target.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => target.records.push(record),
            }
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> postal_assistant_core::Result<Vec<VectorMatch>> {
        let collections = self.collections.read();
        let Some(target) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<VectorMatch> = target
            .records
            .iter()
            .map(|record| VectorMatch {
                id: record.id.clone(),
                content: record.content.clone(),
                similarity: cosine_similarity(vector, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> postal_assistant_core::Result<u64> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|c| c.records.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("info", 2).await.unwrap();
        index
            .upsert(
                "info",
                vec![
                    VectorRecord::new("a", vec![1.0, 0.0], "east"),
                    VectorRecord::new("b", vec![0.0, 1.0], "north"),
                    VectorRecord::new("c", vec![1.0, 1.0], "north-east"),
                ],
            )
            .await
            .unwrap();

        let matches = index.search("info", &[1.0, 0.1], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[1].id, "c");
        assert!(matches[0].distance() < 0.01);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("questions", 2).await.unwrap();
        let record = VectorRecord::new("q", vec![1.0, 0.0], "Скільки коштує?");
        index.upsert("questions", vec![record.clone()]).await.unwrap();
        index.upsert("questions", vec![record]).await.unwrap();

        assert_eq!(index.count("questions").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let index = InMemoryVectorIndex::new();
        assert!(index.search("absent", &[1.0], 3).await.unwrap().is_empty());
        assert_eq!(index.count("absent").await.unwrap(), 0);
        assert!(index
            .upsert("absent", vec![VectorRecord::new("x", vec![1.0], "x")])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("info", 3).await.unwrap();
        let result = index
            .upsert("info", vec![VectorRecord::new("x", vec![1.0], "x")])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_collection() {
        let index = InMemoryVectorIndex::new();
        index.ensure_collection("info", 1).await.unwrap();
        index
            .upsert("info", vec![VectorRecord::new("x", vec![1.0], "x")])
            .await
            .unwrap();
        index.delete_collection("info").await.unwrap();
        assert_eq!(index.count("info").await.unwrap(), 0);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
