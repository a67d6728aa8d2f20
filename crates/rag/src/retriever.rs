//! Retrieval strategies and their combinations
//!
//! Per collection, one or more strategies run concurrently and are fused with
//! weighted Reciprocal Rank Fusion:
//!
//! ```text
//! score(d) = Σ_i  w_i / (rrf_k + rank_i(d) + 1)
//! ```
//!
//! Collections are then interleaved round-robin in configuration order.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use postal_assistant_config::{RetrievalConfig, StrategyKind};
use postal_assistant_core::{Document, Embedder, Retriever, VectorIndex};

use crate::ingest::KnowledgeBase;
use crate::sparse_search::SparseIndex;
use crate::RagError;

/// Metadata key holding the file a vector came from
pub(crate) const SOURCE_KEY: &str = "source";

/// BM25 top-k over one collection
///
/// BM25 scores are unbounded, so no score threshold applies.
pub struct LexicalRetriever {
    index: Arc<SparseIndex>,
    k: usize,
    name: String,
}

impl LexicalRetriever {
    pub fn new(index: Arc<SparseIndex>, k: usize) -> Self {
        let name = format!("lexical:{}", index.collection());
        Self { index, k, name }
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    async fn retrieve(&self, query: &str) -> postal_assistant_core::Result<Vec<Document>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Tantivy search is CPU-bound
        let index = self.index.clone();
        let query = query.to_string();
        let k = self.k;
        let results = tokio::task::spawn_blocking(move || index.search(&query, k))
            .await
            .map_err(|e| RagError::Search(format!("Lexical search task failed: {}", e)))??;

        Ok(results)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Embedding similarity top-k over one collection
pub struct SemanticRetriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    k: usize,
    score_threshold: Option<f32>,
    name: String,
}

impl SemanticRetriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
        k: usize,
        score_threshold: Option<f32>,
    ) -> Self {
        let collection = collection.into();
        Self {
            name: format!("semantic:{}", collection),
            index,
            embedder,
            collection,
            k,
            score_threshold,
        }
    }
}

#[async_trait]
impl Retriever for SemanticRetriever {
    async fn retrieve(&self, query: &str) -> postal_assistant_core::Result<Vec<Document>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_query(query).await?;
        let matches = self.index.search(&self.collection, &vector, self.k).await?;

        Ok(matches
            .into_iter()
            .filter(|m| self.score_threshold.map_or(true, |t| m.similarity >= t))
            .map(|m| {
                let source = m.metadata.get(SOURCE_KEY).cloned().unwrap_or_default();
                Document::new(m.id, m.content, self.collection.clone(), source)
                    .with_score(m.similarity)
            })
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Weighted RRF over several strategies of one collection
pub struct EnsembleRetriever {
    retrievers: Vec<(Arc<dyn Retriever>, f32)>,
    rrf_k: f32,
    name: String,
}

impl EnsembleRetriever {
    pub fn new(name: impl Into<String>, retrievers: Vec<(Arc<dyn Retriever>, f32)>, rrf_k: f32) -> Self {
        Self {
            retrievers,
            rrf_k,
            name: name.into(),
        }
    }
}

/// Fuse ranked lists; ties keep first-seen order (list order, then rank)
pub(crate) fn reciprocal_rank_fusion(
    ranked: Vec<Vec<Document>>,
    weights: &[f32],
    rrf_k: f32,
) -> Vec<Document> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut fused: Vec<(f32, Document)> = Vec::new();

    for (list, weight) in ranked.into_iter().zip(weights) {
        for (rank, doc) in list.into_iter().enumerate() {
            let score = weight / (rrf_k + rank as f32 + 1.0);
            match positions.get(&doc.id) {
                Some(&i) => fused[i].0 += score,
                None => {
                    positions.insert(doc.id.clone(), fused.len());
                    fused.push((score, doc));
                },
            }
        }
    }

    // sort_by is stable
    fused.sort_by(|a, b| b.0.total_cmp(&a.0));
    fused
        .into_iter()
        .map(|(score, doc)| doc.with_score(score))
        .collect()
}

#[async_trait]
impl Retriever for EnsembleRetriever {
    async fn retrieve(&self, query: &str) -> postal_assistant_core::Result<Vec<Document>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let ranked = try_join_all(self.retrievers.iter().map(|(r, _)| r.retrieve(query))).await?;
        let weights: Vec<f32> = self.retrievers.iter().map(|(_, w)| *w).collect();

        let fused = reciprocal_rank_fusion(ranked, &weights, self.rrf_k);
        tracing::debug!(retriever = %self.name, results = fused.len(), "Ensemble retrieval");
        Ok(fused)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Round-robin interleave of several collections, first occurrence wins
pub struct MergerRetriever {
    retrievers: Vec<Arc<dyn Retriever>>,
}

impl MergerRetriever {
    pub fn new(retrievers: Vec<Arc<dyn Retriever>>) -> Self {
        Self { retrievers }
    }
}

pub(crate) fn interleave(lists: Vec<Vec<Document>>) -> Vec<Document> {
    let total = lists.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    let mut seen = HashSet::new();
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();

    loop {
        let mut progressed = false;
        for iter in iters.iter_mut() {
            if let Some(doc) = iter.next() {
                progressed = true;
                if seen.insert(doc.id.clone()) {
                    merged.push(doc);
                }
            }
        }
        if !progressed {
            break;
        }
    }

    merged
}

#[async_trait]
impl Retriever for MergerRetriever {
    async fn retrieve(&self, query: &str) -> postal_assistant_core::Result<Vec<Document>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let lists = try_join_all(self.retrievers.iter().map(|r| r.retrieve(query))).await?;
        Ok(interleave(lists))
    }

    fn name(&self) -> &str {
        "merger"
    }
}

/// Assemble the retriever tree described by `config`
pub fn build_retriever(
    config: &RetrievalConfig,
    knowledge: &KnowledgeBase,
    vector_index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn Retriever>, RagError> {
    let mut per_collection: Vec<Arc<dyn Retriever>> = Vec::with_capacity(config.collections.len());

    for collection in &config.collections {
        let mut strategies: Vec<(Arc<dyn Retriever>, f32)> = Vec::new();

        for strategy in &collection.strategies {
            let retriever: Arc<dyn Retriever> = match strategy.kind {
                StrategyKind::Lexical => {
                    let index = knowledge.lexical_index(&collection.name).ok_or_else(|| {
                        RagError::Knowledge(format!(
                            "No lexical index for collection {}",
                            collection.name
                        ))
                    })?;
                    Arc::new(LexicalRetriever::new(index, strategy.k))
                },
                StrategyKind::Semantic => Arc::new(SemanticRetriever::new(
                    vector_index.clone(),
                    embedder.clone(),
                    collection.name.clone(),
                    strategy.k,
                    strategy.score_threshold,
                )),
            };
            strategies.push((retriever, strategy.weight));
        }

        let retriever: Arc<dyn Retriever> = match strategies.len() {
            0 => {
                return Err(RagError::Knowledge(format!(
                    "Collection {} has no retrieval strategies",
                    collection.name
                )))
            },
            1 => strategies.remove(0).0,
            _ => Arc::new(EnsembleRetriever::new(
                format!("ensemble:{}", collection.name),
                strategies,
                config.rrf_k,
            )),
        };

        tracing::info!(
            collection = %collection.name,
            retriever = %retriever.name(),
            "Configured collection retriever"
        );
        per_collection.push(retriever);
    }

    Ok(if per_collection.len() == 1 {
        per_collection.remove(0)
    } else {
        Arc::new(MergerRetriever::new(per_collection))
    })
}
