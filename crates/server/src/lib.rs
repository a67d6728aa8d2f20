//! Postal Assistant Server
//!
//! HTTP API for text and audio chat, plus the wiring shared by the
//! `postal-assistant`, `postal-stt` and `postal-tts` binaries.

pub mod bootstrap;
pub mod http;
pub mod locales;
pub mod metrics;
pub mod session;
pub mod state;
pub mod telemetry;

pub use bootstrap::{build_state, build_stt_router, build_tts_router, serve, shutdown_signal};
pub use http::create_router;
pub use metrics::init_metrics;
pub use session::{Session, SessionManager};
pub use state::AppState;
pub use telemetry::init_tracing;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use postal_assistant_agent::AgentError;
use postal_assistant_speech::SpeechError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Max sessions reached")]
    SessionLimit,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported language")]
    UnsupportedLanguage(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Startup error: {0}")]
    Startup(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::SessionLimit => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) | ServerError::UnsupportedLanguage(_) => {
                StatusCode::BAD_REQUEST
            },
            ServerError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ServerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Persistence(_) | ServerError::Startup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Wrap a startup failure with the component that failed
    pub fn startup<E: std::fmt::Display>(component: &'static str) -> impl FnOnce(E) -> Self {
        move |err| ServerError::Startup(format!("{}: {}", component, err))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            AgentError::Store(msg) => ServerError::Persistence(msg),
            AgentError::Timeout(msg) => ServerError::Timeout(msg),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<SpeechError> for ServerError {
    fn from(err: SpeechError) -> Self {
        match err {
            SpeechError::UnsupportedLanguage(lang) => ServerError::UnsupportedLanguage(lang),
            SpeechError::MissingText | SpeechError::MissingAudio | SpeechError::InvalidAudio(_) => {
                ServerError::InvalidRequest(err.to_string())
            },
            SpeechError::Timeout => ServerError::Timeout("speech service".to_string()),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<ServerError> for postal_assistant_core::Error {
    fn from(err: ServerError) -> Self {
        use postal_assistant_core::Error;
        match err {
            ServerError::InvalidRequest(msg) => Error::InvalidInput(msg),
            ServerError::UnsupportedLanguage(lang) => Error::UnsupportedLanguage(lang),
            ServerError::Timeout(msg) => Error::Timeout(msg),
            ServerError::Persistence(msg) => Error::Persistence(msg),
            ServerError::Startup(msg) => Error::Config(msg),
            ServerError::Upstream(msg) => Error::Llm(msg),
            other => Error::InvalidInput(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_errors_map_to_statuses() {
        let err: ServerError = AgentError::InvalidInput("empty".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ServerError = AgentError::Llm("down".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err: ServerError = AgentError::Timeout("tool".to_string()).into();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_speech_errors_map_to_statuses() {
        let err: ServerError = SpeechError::UnsupportedLanguage("de".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Unsupported language");

        let err: ServerError = SpeechError::Engine("crashed".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
