use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Unsupported language: {0}. Run 'pdf-audio languages' for the list of codes.")]
    UnsupportedLanguage(String),

    #[error("Nothing to speak: text is empty")]
    EmptyText,

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("No audio stream in response")]
    NoAudio,

    #[error("Failed to decode audio: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, SpeechError>;
