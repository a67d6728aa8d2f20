//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

use postal_assistant_agent::ChatHandler;
use postal_assistant_config::Settings;
use postal_assistant_speech::SpeechClient;

use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub sessions: Arc<SessionManager>,
    pub chat: Arc<ChatHandler>,
    pub speech: Arc<SpeechClient>,
    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(settings: Settings, chat: Arc<ChatHandler>, speech: Arc<SpeechClient>) -> Self {
        let sessions = Arc::new(SessionManager::new(
            settings.server.max_sessions,
            Duration::from_secs(settings.server.session_ttl_secs),
        ));
        Self {
            settings: Arc::new(settings),
            sessions,
            chat,
            speech,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Requested language, falling back to the configured default
    pub fn language(&self, requested: Option<&str>) -> Result<String, crate::ServerError> {
        let language = requested
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.settings.speech.default_language);
        if !self.settings.speech.supports(language) {
            return Err(crate::ServerError::UnsupportedLanguage(language.to_string()));
        }
        Ok(language.to_string())
    }
}
