//! STT and TTS HTTP services
//!
//! STT: `POST /transcribe?language=uk`, multipart field `file` (mono WAV)
//!      → `{"transcription": "..."}`
//! TTS: `POST /synthesize` with `{"text", "language"}` → `audio/wav`
//!
//! Both answer `400 Unsupported language` for languages the engine lacks.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use postal_assistant_core::{SpeechRecognizer, SpeechSynthesizer};

use crate::wav::{decode_wav, encode_wav};
use crate::SpeechError;

/// Multipart field holding the uploaded audio
pub const FILE_FIELD: &str = "file";

impl IntoResponse for SpeechError {
    fn into_response(self) -> Response {
        let status = match &self {
            SpeechError::UnsupportedLanguage(_)
            | SpeechError::MissingText
            | SpeechError::MissingAudio
            | SpeechError::InvalidAudio(_) => StatusCode::BAD_REQUEST,
            SpeechError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            SpeechError::Engine(_) | SpeechError::Network(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::warn!(error = %self, "Speech request failed");
        }
        (status, self.to_string()).into_response()
    }
}

fn record(service: &'static str, result: &Result<impl Sized, SpeechError>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!("speech_requests_total", "service" => service, "outcome" => outcome)
        .increment(1);
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Clone)]
pub struct SttState {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub default_language: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    pub language: Option<String>,
}

pub fn stt_router(state: SttState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn transcribe(
    State(state): State<SttState>,
    Query(query): Query<LanguageQuery>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, SpeechError> {
    let result = transcribe_upload(&state, query, multipart).await;
    record("stt", &result);
    result.map(|transcription| Json(json!({ "transcription": transcription })))
}

async fn transcribe_upload(
    state: &SttState,
    query: LanguageQuery,
    mut multipart: Multipart,
) -> Result<String, SpeechError> {
    let language = query
        .language
        .unwrap_or_else(|| state.default_language.clone());
    if !state.recognizer.supports_language(&language) {
        return Err(SpeechError::UnsupportedLanguage(language));
    }

    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SpeechError::InvalidAudio(e.to_string()))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| SpeechError::InvalidAudio(e.to_string()))?;
            audio = Some(bytes);
            break;
        }
    }
    let audio = audio.ok_or(SpeechError::MissingAudio)?;

    let clip = decode_wav(&audio)?;
    tracing::debug!(
        language = %language,
        duration_secs = clip.duration_secs(),
        sample_rate = clip.sample_rate,
        "Transcribing upload"
    );

    Ok(state.recognizer.transcribe(&clip, &language).await?)
}

#[derive(Clone)]
pub struct TtsState {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub default_language: String,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: Option<String>,
    pub language: Option<String>,
}

pub fn tts_router(state: TtsState) -> Router {
    Router::new()
        .route("/synthesize", post(synthesize))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn synthesize(
    State(state): State<TtsState>,
    Json(request): Json<SynthesizeRequest>,
) -> Result<Response, SpeechError> {
    let result = synthesize_text(&state, request).await;
    record("tts", &result);
    let wav = result?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}

async fn synthesize_text(state: &TtsState, request: SynthesizeRequest) -> Result<Vec<u8>, SpeechError> {
    let language = request
        .language
        .unwrap_or_else(|| state.default_language.clone());
    if !state.synthesizer.supports_language(&language) {
        return Err(SpeechError::UnsupportedLanguage(language));
    }

    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or(SpeechError::MissingText)?;

    let clip = state.synthesizer.synthesize(&text, &language).await?;
    encode_wav(&clip)
}
