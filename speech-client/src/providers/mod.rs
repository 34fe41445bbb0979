//! Speech provider implementations

mod google;
pub mod mock;

pub use google::{GoogleTranslateProvider, MAX_REQUEST_CHARS, split_for_requests};
pub use mock::MockProvider;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::SpeechProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    #[serde(alias = "gtts", alias = "google-translate")]
    Google,
}

/// Settings shared by network providers
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    /// Top-level domain of the Google host (com, co.uk, ...)
    pub tld: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            tld: "com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Create a provider instance
pub fn get_provider(kind: ProviderKind, options: &ProviderOptions) -> Result<Box<dyn SpeechProvider>> {
    match kind {
        ProviderKind::Google => Ok(Box::new(GoogleTranslateProvider::new(
            &options.tld,
            options.timeout,
        )?)),
    }
}
