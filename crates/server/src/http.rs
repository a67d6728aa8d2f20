//! HTTP Endpoints
//!
//! REST API for the postal assistant.

use axum::{
    extract::{DefaultBodyLimit, Json, Multipart, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use postal_assistant_core::ChatTurn;
use postal_assistant_speech::service::FILE_FIELD;

use crate::locales::locale;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let timeout = Duration::from_secs(server.timeout_seconds);
    let cors = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let upload_limit = state.settings.speech.max_upload_bytes;

    let audio = Router::new()
        .route("/api/chat/:session_id/audio", post(chat_audio))
        .layer(DefaultBodyLimit::max(upload_limit));

    let router = Router::new()
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Chat
        .route("/api/chat/:session_id", post(chat))
        .merge(audio)
        // Speech synthesis proxy
        .route("/api/speech", post(synthesize))
        // UI strings
        .route("/api/locales/:lang", get(get_locale))
        .route("/api/tools", get(list_tools))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http());

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.with_state(state)
}

/// CORS layer from configured origins
///
/// Disabled CORS adds no layer; an empty origin list allows any origin.
fn build_cors_layer(origins: &[String], enabled: bool) -> Option<CorsLayer> {
    if !enabled {
        return None;
    }

    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
    if origins.is_empty() {
        tracing::info!("No CORS origins configured, allowing any origin");
        return Some(CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers(Any));
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    tracing::info!(origins = parsed.len(), "CORS configured");
    Some(
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods(methods)
            .allow_headers(Any),
    )
}

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSessionResponse {
    session_id: String,
    language: String,
    greeting: String,
}

async fn create_session(
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), ServerError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let language = state.language(request.language.as_deref())?;
    let session = state.sessions.create(&language)?;

    let greeting = locale(&language)
        .map(|l| l.hello_assistant.to_string())
        .unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id.clone(),
            language,
            greeting,
        }),
    ))
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    session_id: String,
    language: String,
    created_at: String,
    idle_secs: u64,
    turn_count: usize,
    messages: Vec<ChatTurn>,
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;
    let messages = state.chat.transcript(&id).await?;

    Ok(Json(SessionInfo {
        session_id: session.id.clone(),
        language: session.language.clone(),
        created_at: session.created_at.to_rfc3339(),
        idle_secs: session.idle_for().as_secs(),
        turn_count: messages.len(),
        messages,
    }))
}

/// Reset chat: clears the transcript and drops the session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if !state.sessions.remove(&id) {
        return Err(ServerError::SessionNotFound(id));
    }
    state.chat.reset(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    state.sessions.activate(&session_id)?;
    let response = state.chat.handle(&session_id, &request.message).await?;
    Ok(Json(ChatResponse { response }))
}

#[derive(Debug, Deserialize)]
struct LanguageQuery {
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct AudioChatResponse {
    transcription: String,
    response: String,
}

/// Transcribe an uploaded clip, then chat with the transcription
async fn chat_audio(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<LanguageQuery>,
    mut multipart: Multipart,
) -> Result<Json<AudioChatResponse>, ServerError> {
    let session = state.sessions.activate(&session_id)?;
    let language = state.language(query.language.as_deref().or(Some(session.language.as_str())))?;

    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
            audio = Some(bytes.to_vec());
            break;
        }
    }
    let audio = audio.ok_or_else(|| ServerError::InvalidRequest("Missing audio file".to_string()))?;

    let transcription = state.speech.transcribe(audio, &language).await?;
    if transcription.trim().is_empty() {
        return Err(ServerError::InvalidRequest("No speech recognized".to_string()));
    }
    tracing::debug!(session_id = %session_id, language = %language, "Transcribed audio message");

    let response = state.chat.handle(&session_id, &transcription).await?;
    Ok(Json(AudioChatResponse {
        transcription,
        response,
    }))
}

#[derive(Debug, Deserialize)]
struct SpeechRequest {
    text: String,
    language: Option<String>,
}

async fn synthesize(
    State(state): State<AppState>,
    Json(request): Json<SpeechRequest>,
) -> Result<Response, ServerError> {
    if request.text.trim().is_empty() {
        return Err(ServerError::InvalidRequest("Missing text".to_string()));
    }
    let language = state.language(request.language.as_deref())?;
    let wav = state.speech.synthesize(&request.text, &language).await?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}

async fn get_locale(
    Path(lang): Path<String>,
) -> Result<Json<&'static crate::locales::Locale>, ServerError> {
    locale(&lang)
        .map(Json)
        .ok_or(ServerError::UnsupportedLanguage(lang))
}

async fn list_tools(State(state): State<AppState>) -> Json<serde_json::Value> {
    let executor = state.chat.dispatcher().tools();
    let tools: Vec<serde_json::Value> = executor
        .list_tools()
        .into_iter()
        .map(|t| {
            serde_json::json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.input_schema.to_json(),
                "return_direct": executor.is_return_direct(&t.name),
            })
        })
        .collect();

    Json(serde_json::json!({ "tools": tools }))
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.environment,
        "sessions": state.sessions.count(),
        "tools": state.chat.dispatcher().tools().list_tools().len(),
    }))
}
