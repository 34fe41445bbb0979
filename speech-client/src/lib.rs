//! Speech synthesis client library for pdf-audiobook
//!
//! Provides a unified interface for text-to-speech providers:
//! - Google Translate speech endpoint (network)
//! - Mock provider with scripted failures (testing)

pub mod error;
pub mod languages;
pub mod provider;
pub mod providers;

pub use error::{Result, SpeechError};
pub use provider::{AudioFormat, SpeechAudio, SpeechProvider, SpeechRequest};
pub use providers::{MockProvider, ProviderKind, ProviderOptions, get_provider};
