//! Speech services for the postal assistant
//!
//! - `service`: the STT and TTS HTTP microservices
//! - `engines`: recognizers and synthesizers backed by upstream inference servers
//! - `client`: what the chat server uses to reach the services
//! - `wav`: mono 16-bit WAV decoding and encoding

pub mod client;
pub mod engines;
pub mod service;
pub mod wav;

pub use client::SpeechClient;
pub use engines::{HttpRecognizer, HttpSynthesizer};
pub use service::{stt_router, tts_router, SttState, TtsState};
pub use wav::{decode_wav, encode_wav};

use thiserror::Error;

/// Speech errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Unsupported language")]
    UnsupportedLanguage(String),

    #[error("Missing text")]
    MissingText,

    #[error("Missing audio file")]
    MissingAudio,

    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Network(err.to_string())
        }
    }
}

impl From<hound::Error> for SpeechError {
    fn from(err: hound::Error) -> Self {
        SpeechError::InvalidAudio(err.to_string())
    }
}

impl From<SpeechError> for postal_assistant_core::Error {
    fn from(err: SpeechError) -> Self {
        use postal_assistant_core::Error;
        match err {
            SpeechError::UnsupportedLanguage(lang) => Error::UnsupportedLanguage(lang),
            SpeechError::MissingText | SpeechError::MissingAudio | SpeechError::InvalidAudio(_) => {
                Error::InvalidInput(err.to_string())
            },
            SpeechError::Timeout => Error::Timeout("speech request".to_string()),
            other => Error::Speech(other.to_string()),
        }
    }
}

impl From<postal_assistant_core::Error> for SpeechError {
    fn from(err: postal_assistant_core::Error) -> Self {
        use postal_assistant_core::Error;
        match err {
            Error::UnsupportedLanguage(lang) => SpeechError::UnsupportedLanguage(lang),
            Error::InvalidInput(msg) => SpeechError::InvalidAudio(msg),
            Error::Timeout(_) => SpeechError::Timeout,
            other => SpeechError::Engine(other.to_string()),
        }
    }
}
