//! Embedding cache backed by the key-value store
//!
//! Keys are the SHA-256 hex digest of the text; values are JSON arrays.
//! The store is expected to be namespaced per embedding model.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use postal_assistant_core::{Embedder, KeyValueStore};

/// Wraps an embedder, reusing vectors computed earlier
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    store: Arc<dyn KeyValueStore>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { inner, store }
    }

    /// Key-value namespace for a model
    pub fn namespace(prefix: &str, model: &str) -> String {
        format!("{}:{}", prefix, model)
    }

    fn key(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }

    async fn lookup(&self, text: &str) -> postal_assistant_core::Result<Option<Vec<f32>>> {
        let Some(raw) = self.store.get(&Self::key(text)).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Vec<f32>>(&raw) {
            Ok(vector) if vector.len() == self.inner.dimension() => Ok(Some(vector)),
            Ok(_) | Err(_) => {
                tracing::warn!(model = %self.inner.model_name(), "Discarding malformed cached embedding");
                Ok(None)
            },
        }
    }

    async fn remember(&self, text: &str, vector: &[f32]) -> postal_assistant_core::Result<()> {
        let raw = serde_json::to_string(vector)?;
        self.store.set(&Self::key(text), &raw).await
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed_query(&self, text: &str) -> postal_assistant_core::Result<Vec<f32>> {
        if let Some(vector) = self.lookup(text).await? {
            return Ok(vector);
        }
        let vector = self.inner.embed_query(text).await?;
        self.remember(text, &vector).await?;
        Ok(vector)
    }

    async fn embed_documents(&self, texts: &[String]) -> postal_assistant_core::Result<Vec<Vec<f32>>> {
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let cached = self.lookup(text).await?;
            if cached.is_none() {
                missing.push(i);
            }
            vectors.push(cached);
        }

        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let computed = self.inner.embed_documents(&batch).await?;
            for (i, vector) in missing.iter().copied().zip(computed) {
                self.remember(&texts[i], &vector).await?;
                vectors[i] = Some(vector);
            }
        }

        tracing::debug!(
            total = texts.len(),
            computed = missing.len(),
            "Embedded documents"
        );

        vectors
            .into_iter()
            .map(|v| {
                v.ok_or_else(|| {
                    postal_assistant_core::Error::Embedding(
                        "Embedder returned fewer vectors than requested".to_string(),
                    )
                })
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashingEmbedder;
    use postal_assistant_persistence::InMemoryKeyValueStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        inner: HashingEmbedder,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed_query(&self, text: &str) -> postal_assistant_core::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.inner.embed(text))
        }

        async fn embed_documents(&self, texts: &[String]) -> postal_assistant_core::Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| self.inner.embed(t)).collect())
        }

        fn dimension(&self) -> usize {
            16
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn setup() -> (Arc<CountingEmbedder>, Arc<InMemoryKeyValueStore>, CachedEmbedder) {
        let inner = Arc::new(CountingEmbedder {
            inner: HashingEmbedder::new(16),
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(InMemoryKeyValueStore::new());
        let cached = CachedEmbedder::new(inner.clone(), store.clone());
        (inner, store, cached)
    }

    #[tokio::test]
    async fn test_query_is_cached() {
        let (inner, store, cached) = setup();

        let first = cached.embed_query("Де моя посилка?").await.unwrap();
        let second = cached.embed_query("Де моя посилка?").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_documents_only_embed_missing() {
        let (inner, _store, cached) = setup();
        cached.embed_query("b").await.unwrap();

        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = cached.embed_documents(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_malformed_entry_recomputed() {
        let (inner, store, cached) = setup();
        store.set(&CachedEmbedder::key("x"), "not json").await.unwrap();

        cached.embed_query("x").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_namespace() {
        assert_eq!(
            CachedEmbedder::namespace("embedding", "text-embedding-3-small"),
            "embedding:text-embedding-3-small"
        );
    }
}
