//! Router-level tests for the STT and TTS services

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use postal_assistant_core::{AudioClip, Result, SpeechRecognizer, SpeechSynthesizer};
use postal_assistant_speech::{
    decode_wav, encode_wav, stt_router, tts_router, SttState, TtsState,
};

const BOUNDARY: &str = "postal-test-boundary";

struct FakeRecognizer {
    languages: Vec<String>,
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn transcribe(&self, audio: &AudioClip, language: &str) -> Result<String> {
        Ok(format!("{} samples in {}", audio.samples.len(), language))
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn model_name(&self) -> &str {
        "fake-asr"
    }
}

struct FakeSynthesizer {
    languages: Vec<String>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<AudioClip> {
        Ok(AudioClip::new(vec![1; text.chars().count()], 16_000))
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }

    fn model_name(&self) -> &str {
        "fake-tts"
    }
}

fn languages() -> Vec<String> {
    vec!["uk".to_string(), "en".to_string()]
}

fn stt() -> Router {
    stt_router(
        SttState {
            recognizer: Arc::new(FakeRecognizer { languages: languages() }),
            default_language: "uk".to_string(),
        },
        1024 * 1024,
    )
}

fn tts() -> Router {
    tts_router(TtsState {
        synthesizer: Arc::new(FakeSynthesizer { languages: languages() }),
        default_language: "uk".to_string(),
    })
}

fn multipart_body(field: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"a.wav\"\r\nContent-Type: audio/wav\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, field: &str, content: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, content)))
        .unwrap()
}

fn stereo_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..8 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn test_transcribe_upload() {
    let wav = encode_wav(&AudioClip::new(vec![0; 160], 16_000)).unwrap();
    let response = stt()
        .oneshot(upload("/transcribe?language=en", "file", &wav))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["transcription"], "160 samples in en");
}

#[tokio::test]
async fn test_transcribe_defaults_language() {
    let wav = encode_wav(&AudioClip::new(vec![0; 10], 16_000)).unwrap();
    let response = stt().oneshot(upload("/transcribe", "file", &wav)).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["transcription"], "10 samples in uk");
}

#[tokio::test]
async fn test_transcribe_unsupported_language() {
    let wav = encode_wav(&AudioClip::new(vec![0; 10], 16_000)).unwrap();
    let response = stt()
        .oneshot(upload("/transcribe?language=de", "file", &wav))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Unsupported language");
}

#[tokio::test]
async fn test_transcribe_missing_file() {
    let response = stt()
        .oneshot(upload("/transcribe", "attachment", b"whatever"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transcribe_rejects_stereo() {
    let response = stt()
        .oneshot(upload("/transcribe", "file", &stereo_wav()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("mono"));
}

#[tokio::test]
async fn test_synthesize_returns_wav() {
    let request = Request::builder()
        .method("POST")
        .uri("/synthesize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "Привіт", "language": "uk"}"#))
        .unwrap();
    let response = tts().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let clip = decode_wav(&bytes).unwrap();
    assert_eq!(clip.samples.len(), 6);
}

#[tokio::test]
async fn test_synthesize_missing_text() {
    let request = Request::builder()
        .method("POST")
        .uri("/synthesize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"language": "uk"}"#))
        .unwrap();
    let response = tts().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Missing text");
}

#[tokio::test]
async fn test_synthesize_unsupported_language() {
    let request = Request::builder()
        .method("POST")
        .uri("/synthesize")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "Hallo", "language": "de"}"#))
        .unwrap();
    let response = tts().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Unsupported language");
}

#[tokio::test]
async fn test_health() {
    let response = tts()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
