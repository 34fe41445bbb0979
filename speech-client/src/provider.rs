use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a speech provider
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
    pub slow: bool,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            slow: false,
        }
    }

    pub fn slow(mut self, slow: bool) -> Self {
        self.slow = slow;
        self
    }
}

/// Encoded audio container produced by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

/// Synthesized audio returned by a provider
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

/// Trait for speech providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize one request into encoded audio
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Container format of the audio this provider returns
    fn format(&self) -> AudioFormat;

    /// Check that the provider can speak the given language
    fn check_language(&self, language: &str) -> Result<()>;
}
