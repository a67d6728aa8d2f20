//! Knowledge ingestion
//!
//! Lexical indexes live in RAM and are rebuilt from disk at every start.
//! Vector collections persist in the vector store; re-ingesting one deletes
//! and recreates it, so stale documents never survive.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use postal_assistant_config::{KnowledgeConfig, RetrievalConfig};
use postal_assistant_core::{Embedder, VectorIndex, VectorRecord};

use crate::knowledge_loader::{KnowledgeCollection, KnowledgeLoader};
use crate::retriever::SOURCE_KEY;
use crate::sparse_search::{SparseConfig, SparseIndex};
use crate::RagError;

/// Loaded collections with their lexical indexes
pub struct KnowledgeBase {
    collections: Vec<KnowledgeCollection>,
    lexical: HashMap<String, Arc<SparseIndex>>,
}

impl KnowledgeBase {
    /// Load the knowledge directory and build lexical indexes
    ///
    /// Collections named in the retrieval configuration but absent on disk
    /// get an empty index.
    pub fn load(knowledge: &KnowledgeConfig, retrieval: &RetrievalConfig) -> Result<Self, RagError> {
        let collections =
            KnowledgeLoader::new(Path::new(&knowledge.base_dir), knowledge.extension.clone())
                .load()?;
        Self::from_collections(collections, retrieval)
    }

    pub fn from_collections(
        mut collections: Vec<KnowledgeCollection>,
        retrieval: &RetrievalConfig,
    ) -> Result<Self, RagError> {
        for configured in &retrieval.collections {
            if !collections.iter().any(|c| c.name == configured.name) {
                tracing::warn!(
                    collection = %configured.name,
                    "Configured collection has no documents"
                );
                collections.push(KnowledgeCollection {
                    name: configured.name.clone(),
                    documents: Vec::new(),
                });
            }
        }
        for loaded in &collections {
            if retrieval.collection(&loaded.name).is_none() {
                tracing::warn!(
                    collection = %loaded.name,
                    "Collection is not configured for retrieval"
                );
            }
        }

        let sparse_config = SparseConfig {
            stemmer: retrieval.stemmer.clone(),
            max_token_length: retrieval.max_token_length,
        };

        let mut lexical = HashMap::with_capacity(collections.len());
        for collection in &collections {
            let index = SparseIndex::new(collection.name.clone(), &sparse_config)?;
            index.replace_documents(&collection.documents)?;
            lexical.insert(collection.name.clone(), Arc::new(index));
        }

        Ok(Self {
            collections,
            lexical,
        })
    }

    pub fn collections(&self) -> &[KnowledgeCollection] {
        &self.collections
    }

    pub fn lexical_index(&self, collection: &str) -> Option<Arc<SparseIndex>> {
        self.lexical.get(collection).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.collections.iter().map(KnowledgeCollection::len).sum()
    }
}

/// Writes knowledge collections into the vector store
pub struct VectorIngest {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl VectorIngest {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Replace one collection's vectors; returns the number of documents written
    pub async fn ingest_collection(
        &self,
        collection: &KnowledgeCollection,
    ) -> postal_assistant_core::Result<usize> {
        self.index.delete_collection(&collection.name).await?;
        self.index
            .ensure_collection(&collection.name, self.embedder.dimension())
            .await?;

        if collection.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = collection
            .documents
            .iter()
            .map(|d| d.content.clone())
            .collect();
        let vectors = self.embedder.embed_documents(&texts).await?;

        let records: Vec<VectorRecord> = collection
            .documents
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| {
                VectorRecord::new(doc.id.clone(), vector, doc.content.clone())
                    .with_metadata(SOURCE_KEY, doc.source.clone())
            })
            .collect();
        let written = records.len();
        self.index.upsert(&collection.name, records).await?;

        tracing::info!(
            collection = %collection.name,
            documents = written,
            model = %self.embedder.model_name(),
            "Ingested collection"
        );
        Ok(written)
    }

    /// Ingest every collection
    ///
    /// Without `force`, collections that already hold vectors are left alone.
    pub async fn ingest_all(
        &self,
        knowledge: &KnowledgeBase,
        force: bool,
    ) -> postal_assistant_core::Result<usize> {
        let mut total = 0;
        for collection in knowledge.collections() {
            if !force && self.index.count(&collection.name).await? > 0 {
                tracing::debug!(collection = %collection.name, "Vectors present, skipping ingest");
                continue;
            }
            total += self.ingest_collection(collection).await?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HashingEmbedder, InMemoryVectorIndex};
    use postal_assistant_core::Document;

    fn collection(name: &str, docs: &[(&str, &str)]) -> KnowledgeCollection {
        KnowledgeCollection {
            name: name.to_string(),
            documents: docs
                .iter()
                .map(|(source, content)| {
                    Document::new(
                        KnowledgeLoader::document_id(name, source),
                        *content,
                        name,
                        *source,
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_configured_collections_get_indexes() {
        let kb = KnowledgeBase::from_collections(
            vec![collection("info", &[("a.txt", "Доставка за 1-3 дні")])],
            &RetrievalConfig::default(),
        )
        .unwrap();

        assert_eq!(kb.document_count(), 1);
        assert_eq!(kb.lexical_index("info").unwrap().doc_count(), 1);
        assert_eq!(kb.lexical_index("links").unwrap().doc_count(), 0);
        assert!(kb.lexical_index("absent").is_none());
    }

    #[tokio::test]
    async fn test_reingest_replaces_collection() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let ingest = VectorIngest::new(index.clone(), Arc::new(HashingEmbedder::new(32)));

        let first = collection("info", &[("a.txt", "one"), ("b.txt", "two")]);
        assert_eq!(ingest.ingest_collection(&first).await.unwrap(), 2);

        let second = collection("info", &[("c.txt", "three")]);
        ingest.ingest_collection(&second).await.unwrap();
        assert_eq!(index.count("info").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_all_skips_populated_unless_forced() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let ingest = VectorIngest::new(index.clone(), Arc::new(HashingEmbedder::new(32)));
        let kb = KnowledgeBase::from_collections(
            vec![collection("info", &[("a.txt", "one")])],
            &RetrievalConfig::default(),
        )
        .unwrap();

        assert_eq!(ingest.ingest_all(&kb, false).await.unwrap(), 1);
        assert_eq!(ingest.ingest_all(&kb, false).await.unwrap(), 0);
        assert_eq!(ingest.ingest_all(&kb, true).await.unwrap(), 1);
    }
}
