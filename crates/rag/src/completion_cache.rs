//! Semantic completion cache
//!
//! Two stores back one logical cache:
//! - the vector index holds question embeddings (payload = question text)
//! - the key-value store maps the exact question text to its answer
//!
//! A lookup is a hit when the nearest stored question lies within
//! `score_threshold` cosine distance and its answer is still present.

use std::sync::Arc;

use postal_assistant_config::CacheConfig;
use postal_assistant_core::{content_uuid, Embedder, KeyValueStore, VectorIndex, VectorRecord};

pub struct CompletionCache {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    answers: Arc<dyn KeyValueStore>,
    collection: String,
    score_threshold: f32,
}

impl CompletionCache {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        answers: Arc<dyn KeyValueStore>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            answers,
            collection: config.collection.clone(),
            score_threshold: config.score_threshold,
        }
    }

    /// Create the questions collection if needed
    pub async fn ensure_collection(&self) -> postal_assistant_core::Result<()> {
        self.index
            .ensure_collection(&self.collection, self.embedder.dimension())
            .await
    }

    /// Cached answer for a question similar enough to `question`
    pub async fn get(&self, question: &str) -> postal_assistant_core::Result<Option<String>> {
        if question.trim().is_empty() {
            return Ok(None);
        }

        let vector = self.embedder.embed_query(question).await?;
        let nearest = self.index.search(&self.collection, &vector, 1).await?;

        let Some(hit) = nearest.into_iter().next().filter(|m| m.distance() < self.score_threshold)
        else {
            metrics::counter!("completion_cache_misses_total").increment(1);
            tracing::debug!(question, "Completion cache miss");
            return Ok(None);
        };

        match self.answers.get(&hit.content).await? {
            Some(answer) => {
                metrics::counter!("completion_cache_hits_total").increment(1);
                tracing::debug!(
                    question,
                    matched = %hit.content,
                    distance = hit.distance(),
                    "Completion cache hit"
                );
                Ok(Some(answer))
            },
            None => {
                metrics::counter!("completion_cache_misses_total").increment(1);
                tracing::warn!(
                    matched = %hit.content,
                    "Cached question has no stored answer"
                );
                Ok(None)
            },
        }
    }

    /// Store `answer` for `question`
    pub async fn set(&self, question: &str, answer: &str) -> postal_assistant_core::Result<()> {
        if question.trim().is_empty() {
            return Ok(());
        }

        let vector = self.embedder.embed_query(question).await?;
        let record = VectorRecord::new(content_uuid(question).to_string(), vector, question);
        self.index.upsert(&self.collection, vec![record]).await?;
        self.answers.set(question, answer).await?;

        tracing::debug!(question, "Completion cached");
        Ok(())
    }
}
