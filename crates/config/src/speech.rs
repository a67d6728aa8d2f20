//! Speech service configuration
//!
//! The same section configures both sides: the STT/TTS services read their
//! bind address and engine URL, the chat server reads the service URLs.

use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, speech, timeouts};

/// One speech microservice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    /// URL the chat server uses to reach this service
    pub url: String,

    /// Upstream inference server the service delegates to
    pub engine_url: String,

    /// Engine model name, reported in logs
    #[serde(default)]
    pub engine_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_stt")]
    pub stt: SpeechServiceConfig,

    #[serde(default = "default_tts")]
    pub tts: SpeechServiceConfig,

    #[serde(default = "default_languages")]
    pub supported_languages: Vec<String>,

    #[serde(default = "default_language")]
    pub default_language: String,

    /// Sample rate of synthesized audio
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl SpeechConfig {
    pub fn supports(&self, language: &str) -> bool {
        self.supported_languages.iter().any(|l| l == language)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            stt: default_stt(),
            tts: default_tts(),
            supported_languages: default_languages(),
            default_language: default_language(),
            sample_rate: default_sample_rate(),
            max_upload_bytes: default_max_upload(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_stt() -> SpeechServiceConfig {
    SpeechServiceConfig {
        host: default_host(),
        port: speech::STT_PORT,
        url: endpoints::STT_SERVICE_DEFAULT.to_string(),
        engine_url: endpoints::ASR_ENGINE_DEFAULT.to_string(),
        engine_model: None,
    }
}

fn default_tts() -> SpeechServiceConfig {
    SpeechServiceConfig {
        host: default_host(),
        port: speech::TTS_PORT,
        url: endpoints::TTS_SERVICE_DEFAULT.to_string(),
        engine_url: endpoints::TTS_ENGINE_DEFAULT.to_string(),
        engine_model: None,
    }
}

fn default_languages() -> Vec<String> {
    speech::SUPPORTED_LANGUAGES
        .iter()
        .map(|l| l.to_string())
        .collect()
}

fn default_language() -> String {
    speech::DEFAULT_LANGUAGE.to_string()
}

fn default_sample_rate() -> u32 {
    speech::SAMPLE_RATE
}

fn default_max_upload() -> usize {
    speech::MAX_UPLOAD_BYTES
}

fn default_timeout() -> u64 {
    timeouts::SPEECH_SECS
}
