//! Engines backed by upstream inference servers
//!
//! - ASR: `POST {url}/asr?task=transcribe&language=..&output=txt`, multipart `audio_file`
//! - TTS: `POST {url}` with `{"text", "language"}`, answered with WAV bytes

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use postal_assistant_config::SpeechConfig;
use postal_assistant_core::{AudioClip, SpeechRecognizer, SpeechSynthesizer};

use crate::wav::{decode_wav, encode_wav};
use crate::SpeechError;

fn http_client(timeout_secs: u64) -> Result<Client, SpeechError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SpeechError::Network(format!("Failed to create HTTP client: {}", e)))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SpeechError::Engine(format!("HTTP {}: {}", status, body.trim())))
}

/// Speech recognizer calling a Whisper-style ASR server
pub struct HttpRecognizer {
    client: Client,
    url: String,
    model: String,
    languages: Vec<String>,
}

impl HttpRecognizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            url: config.stt.engine_url.trim_end_matches('/').to_string(),
            model: config
                .stt
                .engine_model
                .clone()
                .unwrap_or_else(|| "asr-http".to_string()),
            languages: config.supported_languages.clone(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    async fn transcribe(
        &self,
        audio: &AudioClip,
        language: &str,
    ) -> postal_assistant_core::Result<String> {
        if !self.supports_language(language) {
            return Err(SpeechError::UnsupportedLanguage(language.to_string()).into());
        }

        let wav = encode_wav(audio)?;
        let part = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(SpeechError::from)?;
        let form = Form::new().part("audio_file", part);

        let response = self
            .client
            .post(format!("{}/asr", self.url))
            .query(&[("task", "transcribe"), ("language", language), ("output", "txt")])
            .multipart(form)
            .send()
            .await
            .map_err(SpeechError::from)?;
        let text = check_status(response)
            .await?
            .text()
            .await
            .map_err(SpeechError::from)?;

        tracing::debug!(
            language,
            duration_secs = audio.duration_secs(),
            chars = text.len(),
            "Transcribed audio"
        );
        Ok(text.trim().to_string())
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    language: &'a str,
}

/// Speech synthesizer calling a TTS server that returns WAV
pub struct HttpSynthesizer {
    client: Client,
    url: String,
    model: String,
    languages: Vec<String>,
}

impl HttpSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            url: config.tts.engine_url.clone(),
            model: config
                .tts
                .engine_model
                .clone()
                .unwrap_or_else(|| "tts-http".to_string()),
            languages: config.supported_languages.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> postal_assistant_core::Result<AudioClip> {
        if !self.supports_language(language) {
            return Err(SpeechError::UnsupportedLanguage(language.to_string()).into());
        }

        let response = self
            .client
            .post(&self.url)
            .json(&SynthesisRequest { text, language })
            .send()
            .await
            .map_err(SpeechError::from)?;
        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(SpeechError::from)?;

        let clip = decode_wav(&bytes)
            .map_err(|e| SpeechError::Engine(format!("engine returned bad audio: {}", e)))?;
        tracing::debug!(
            language,
            duration_secs = clip.duration_secs(),
            "Synthesized speech"
        );
        Ok(clip)
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postal_assistant_config::SpeechServiceConfig;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(engine_url: String) -> SpeechConfig {
        let service = SpeechServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            url: String::new(),
            engine_url,
            engine_model: None,
        };
        SpeechConfig {
            stt: service.clone(),
            tts: service,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recognizer_posts_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/asr"))
            .and(query_param("task", "transcribe"))
            .and(query_param("language", "uk"))
            .and(query_param("output", "txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(" Де моя посилка?\n"))
            .mount(&server)
            .await;

        let recognizer = HttpRecognizer::new(&config(server.uri())).unwrap();
        let text = recognizer
            .transcribe(&AudioClip::new(vec![0; 1600], 16_000), "uk")
            .await
            .unwrap();
        assert_eq!(text, "Де моя посилка?");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"audio_file\""));
    }

    #[tokio::test]
    async fn test_recognizer_rejects_unknown_language() {
        let recognizer = HttpRecognizer::new(&config("http://127.0.0.1:9".to_string())).unwrap();
        let err = recognizer
            .transcribe(&AudioClip::new(vec![0; 16], 16_000), "de")
            .await
            .unwrap_err();
        assert!(matches!(err, postal_assistant_core::Error::UnsupportedLanguage(_)));
    }

    #[tokio::test]
    async fn test_synthesizer_decodes_wav() {
        let server = MockServer::start().await;
        let wav = encode_wav(&AudioClip::new(vec![10, -10, 20], 22_050)).unwrap();
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({"text": "Привіт", "language": "uk"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(wav))
            .mount(&server)
            .await;

        let synthesizer = HttpSynthesizer::new(&config(server.uri())).unwrap();
        let clip = synthesizer.synthesize("Привіт", "uk").await.unwrap();
        assert_eq!(clip.samples, vec![10, -10, 20]);
        assert_eq!(clip.sample_rate, 22_050);
    }

    #[tokio::test]
    async fn test_engine_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let synthesizer = HttpSynthesizer::new(&config(server.uri())).unwrap();
        let err = synthesizer.synthesize("Привіт", "uk").await.unwrap_err();
        assert!(matches!(err, postal_assistant_core::Error::Speech(_)));
    }
}
