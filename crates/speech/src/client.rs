//! Client for the STT and TTS services

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use postal_assistant_config::SpeechConfig;

use crate::service::FILE_FIELD;
use crate::SpeechError;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    transcription: String,
}

pub struct SpeechClient {
    client: Client,
    stt_url: String,
    tts_url: String,
}

impl SpeechClient {
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            stt_url: config.stt.url.trim_end_matches('/').to_string(),
            tts_url: config.tts.url.trim_end_matches('/').to_string(),
        })
    }

    /// Transcribe uploaded WAV bytes
    pub async fn transcribe(&self, wav: Vec<u8>, language: &str) -> Result<String, SpeechError> {
        let part = Part::bytes(wav).file_name("audio.wav").mime_str("audio/wav")?;
        let response = self
            .client
            .post(format!("{}/transcribe", self.stt_url))
            .query(&[("language", language)])
            .multipart(Form::new().part(FILE_FIELD, part))
            .send()
            .await?;

        let response = Self::check(response, language).await?;
        let body: TranscriptionResponse = response.json().await?;
        Ok(body.transcription)
    }

    /// Synthesize text to WAV bytes
    pub async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SpeechError> {
        let response = self
            .client
            .post(format!("{}/synthesize", self.tts_url))
            .json(&json!({"text": text, "language": language}))
            .send()
            .await?;

        let response = Self::check(response, language).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Map service error statuses back onto [`SpeechError`]
    async fn check(
        response: reqwest::Response,
        language: &str,
    ) -> Result<reqwest::Response, SpeechError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::BAD_REQUEST if body.contains("Unsupported language") => {
                SpeechError::UnsupportedLanguage(language.to_string())
            },
            StatusCode::BAD_REQUEST if body.contains("Missing text") => SpeechError::MissingText,
            StatusCode::BAD_REQUEST => SpeechError::InvalidAudio(body),
            StatusCode::GATEWAY_TIMEOUT => SpeechError::Timeout,
            _ => SpeechError::Engine(format!("HTTP {}: {}", status, body.trim())),
        })
    }
}
