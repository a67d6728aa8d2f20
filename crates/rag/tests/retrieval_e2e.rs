//! End-to-end retrieval and cache tests over in-memory backends

use async_trait::async_trait;
use std::fs;
use std::sync::Arc;

use postal_assistant_config::{
    CacheConfig, CollectionConfig, KnowledgeConfig, RetrievalConfig, StrategyConfig,
};
use postal_assistant_core::{Embedder, VectorIndex};
use postal_assistant_persistence::InMemoryKeyValueStore;
use postal_assistant_rag::{
    build_retriever, CompletionCache, HashingEmbedder, InMemoryVectorIndex, KnowledgeBase,
    VectorIngest,
};

/// Maps paraphrases of the same question onto one vector
struct ParaphraseEmbedder;

#[async_trait]
impl Embedder for ParaphraseEmbedder {
    async fn embed_query(&self, text: &str) -> postal_assistant_core::Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(if lower.contains("hours") || lower.contains("open") {
            vec![1.0, 0.05, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        })
    }

    async fn embed_documents(&self, texts: &[String]) -> postal_assistant_core::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_query(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "paraphrase"
    }
}

fn retrieval_config() -> RetrievalConfig {
    RetrievalConfig {
        collections: vec![CollectionConfig {
            name: "info".to_string(),
            strategies: vec![
                StrategyConfig::lexical(1),
                StrategyConfig::semantic(3, Some(0.35)),
            ],
        }],
        stemmer: Some("english".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_ingested_document_is_top_result() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("info")).unwrap();
    fs::write(dir.path().join("info/shipping.txt"), "Package X ships in 3 days.").unwrap();
    fs::write(
        dir.path().join("info/returns.txt"),
        "Returns are accepted within 14 days of delivery.",
    )
    .unwrap();

    let knowledge = KnowledgeConfig {
        base_dir: dir.path().to_string_lossy().to_string(),
        ..Default::default()
    };
    let retrieval = retrieval_config();
    let kb = KnowledgeBase::load(&knowledge, &retrieval).unwrap();

    let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(256));
    VectorIngest::new(index.clone(), embedder.clone())
        .ingest_all(&kb, true)
        .await
        .unwrap();

    let retriever = build_retriever(&retrieval, &kb, index, embedder).unwrap();
    let results = retriever.retrieve("When does X ship?").await.unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].content, "Package X ships in 3 days.");
    assert_eq!(results[0].source, "shipping.txt");
}

#[tokio::test]
async fn test_two_collections_interleave() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("info")).unwrap();
    fs::create_dir(dir.path().join("links")).unwrap();
    fs::write(dir.path().join("info/tracking.txt"), "Track a parcel by its number.").unwrap();
    fs::write(
        dir.path().join("links/tracking.txt"),
        "Tracking page: https://tracking.novaposhta.ua",
    )
    .unwrap();

    let retrieval = RetrievalConfig {
        collections: vec![
            CollectionConfig {
                name: "info".to_string(),
                strategies: vec![StrategyConfig::lexical(1)],
            },
            CollectionConfig {
                name: "links".to_string(),
                strategies: vec![StrategyConfig::lexical(1)],
            },
        ],
        ..Default::default()
    };
    let knowledge = KnowledgeConfig {
        base_dir: dir.path().to_string_lossy().to_string(),
        ..Default::default()
    };
    let kb = KnowledgeBase::load(&knowledge, &retrieval).unwrap();
    let retriever = build_retriever(
        &retrieval,
        &kb,
        Arc::new(InMemoryVectorIndex::new()),
        Arc::new(HashingEmbedder::new(16)),
    )
    .unwrap();

    let results = retriever.retrieve("parcel tracking").await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].collection, "info");
    assert_eq!(results[1].collection, "links");
    assert!(retriever.retrieve("   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_paraphrase_hits_cache() {
    let cache = CompletionCache::new(
        Arc::new(ParaphraseEmbedder),
        Arc::new(InMemoryVectorIndex::new()),
        Arc::new(InMemoryKeyValueStore::new()),
        &CacheConfig::default(),
    );
    cache.ensure_collection().await.unwrap();

    cache.set("What are your hours?", "9 to 5").await.unwrap();

    assert_eq!(
        cache.get("What time are you open?").await.unwrap(),
        Some("9 to 5".to_string())
    );
    assert_eq!(cache.get("How much is shipping?").await.unwrap(), None);
}
