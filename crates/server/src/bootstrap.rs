//! Startup wiring shared by the binaries

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

use postal_assistant_agent::{CachedConversationalQa, ChatHandler, ToolDispatcher};
use postal_assistant_config::{Settings, VectorStoreBackend};
use postal_assistant_core::{Embedder, VectorIndex};
use postal_assistant_llm::create_language_model;
use postal_assistant_persistence::{PersistenceLayer, ScyllaConfig};
use postal_assistant_rag::{
    build_retriever, create_embedder, CachedEmbedder, CompletionCache, InMemoryVectorIndex,
    KnowledgeBase, QdrantVectorIndex, VectorIngest,
};
use postal_assistant_speech::{
    stt_router, tts_router, HttpRecognizer, HttpSynthesizer, SpeechClient, SttState, TtsState,
};
use postal_assistant_tools::create_registry;

use crate::state::AppState;
use crate::ServerError;

/// Connect ScyllaDB, falling back to in-memory stores outside strict environments
async fn init_persistence(settings: &Settings) -> Result<PersistenceLayer, ServerError> {
    if !settings.persistence.enabled {
        tracing::info!("Persistence disabled, using in-memory stores");
        return Ok(PersistenceLayer::in_memory());
    }

    let config = ScyllaConfig::from_settings(
        &settings.persistence,
        settings.conversation.transcript_ttl_secs,
    );
    match postal_assistant_persistence::init(config).await {
        Ok(layer) => {
            tracing::info!(
                hosts = ?settings.persistence.scylla_hosts,
                keyspace = %settings.persistence.keyspace,
                "ScyllaDB persistence initialized"
            );
            Ok(layer)
        },
        Err(e) if !settings.environment.is_strict() => {
            tracing::error!(error = %e, "Failed to initialize ScyllaDB, falling back to in-memory");
            Ok(PersistenceLayer::in_memory())
        },
        Err(e) => Err(ServerError::startup("scylla")(e)),
    }
}

fn init_vector_index(settings: &Settings) -> Result<Arc<dyn VectorIndex>, ServerError> {
    Ok(match settings.vector_store.backend {
        VectorStoreBackend::Qdrant => Arc::new(
            QdrantVectorIndex::new(&settings.vector_store).map_err(ServerError::startup("qdrant"))?,
        ),
        VectorStoreBackend::Memory => {
            tracing::warn!("Using in-memory vector index; vectors are rebuilt on every start");
            Arc::new(InMemoryVectorIndex::new())
        },
    })
}

fn init_embedder(
    settings: &Settings,
    persistence: &PersistenceLayer,
) -> Result<Arc<dyn Embedder>, ServerError> {
    let embedder = create_embedder(&settings.embedding).map_err(ServerError::startup("embedder"))?;
    if !settings.embedding.cache_enabled {
        return Ok(embedder);
    }
    let namespace = CachedEmbedder::namespace("embedding", embedder.model_name());
    Ok(Arc::new(CachedEmbedder::new(
        embedder,
        persistence.key_value(&namespace),
    )))
}

/// Build the chat server state
///
/// Knowledge is always re-indexed lexically. Vectors are written when a
/// collection is empty, or for every collection when `force_ingest` is set.
pub async fn build_state(settings: Settings, force_ingest: bool) -> Result<AppState, ServerError> {
    let persistence = init_persistence(&settings).await?;
    let embedder = init_embedder(&settings, &persistence)?;
    let vector_index = init_vector_index(&settings)?;

    let knowledge = KnowledgeBase::load(&settings.knowledge, &settings.retrieval)
        .map_err(ServerError::startup("knowledge"))?;
    let force = force_ingest || settings.knowledge.ingest_on_startup;
    let ingested = VectorIngest::new(vector_index.clone(), embedder.clone())
        .ingest_all(&knowledge, force)
        .await
        .map_err(ServerError::startup("ingest"))?;
    tracing::info!(
        documents = knowledge.document_count(),
        ingested,
        force,
        "Knowledge base ready"
    );

    let retriever = build_retriever(
        &settings.retrieval,
        &knowledge,
        vector_index.clone(),
        embedder.clone(),
    )
    .map_err(ServerError::startup("retriever"))?;

    let cache = Arc::new(CompletionCache::new(
        embedder,
        vector_index,
        persistence.key_value(&settings.cache.namespace),
        &settings.cache,
    ));
    cache
        .ensure_collection()
        .await
        .map_err(ServerError::startup("completion cache"))?;

    let llm = create_language_model(&settings.llm).map_err(ServerError::startup("llm"))?;
    let qa = Arc::new(CachedConversationalQa::new(
        llm.clone(),
        retriever,
        cache,
        settings.conversation.condense_window,
    ));

    let registry = create_registry(&settings.postal_api, &settings.tariff, &settings.agent, qa)
        .map_err(ServerError::startup("tools"))?;
    let dispatcher = Arc::new(ToolDispatcher::new(
        llm,
        Arc::new(registry),
        settings.agent.max_iterations,
    ));
    let chat = Arc::new(ChatHandler::new(
        dispatcher,
        persistence.conversations.clone(),
        settings.conversation.chat_window,
    ));

    let speech = Arc::new(SpeechClient::new(&settings.speech).map_err(ServerError::startup("speech"))?);

    Ok(AppState::new(settings, chat, speech))
}

pub fn build_stt_router(settings: &Settings) -> Result<Router, ServerError> {
    let recognizer =
        HttpRecognizer::new(&settings.speech).map_err(ServerError::startup("recognizer"))?;
    Ok(stt_router(
        SttState {
            recognizer: Arc::new(recognizer),
            default_language: settings.speech.default_language.clone(),
        },
        settings.speech.max_upload_bytes,
    ))
}

pub fn build_tts_router(settings: &Settings) -> Result<Router, ServerError> {
    let synthesizer =
        HttpSynthesizer::new(&settings.speech).map_err(ServerError::startup("synthesizer"))?;
    Ok(tts_router(TtsState {
        synthesizer: Arc::new(synthesizer),
        default_language: settings.speech.default_language.clone(),
    }))
}

/// Bind and serve until SIGINT or SIGTERM
pub async fn serve(router: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
