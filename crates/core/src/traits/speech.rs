//! Speech processing traits

use crate::Result;
use async_trait::async_trait;

/// Mono 16-bit PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Speech-to-Text interface
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + 'static {
    /// Transcribe a mono clip in the given language
    async fn transcribe(&self, audio: &AudioClip, language: &str) -> Result<String>;

    /// Language codes this engine accepts
    fn supported_languages(&self) -> &[String];

    /// Get model name for logging
    fn model_name(&self) -> &str;

    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages().iter().any(|l| l == language)
    }
}

/// Text-to-Speech interface
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Synthesize text to a mono clip
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioClip>;

    /// Language codes this engine accepts
    fn supported_languages(&self) -> &[String];

    /// Get model name for logging
    fn model_name(&self) -> &str;

    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages().iter().any(|l| l == language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_duration() {
        let clip = AudioClip::new(vec![0; 16000], 16000);
        assert!((clip.duration_secs() - 1.0).abs() < f32::EPSILON);
        assert_eq!(AudioClip::new(vec![], 0).duration_secs(), 0.0);
    }
}
