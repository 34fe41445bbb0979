//! Mock speech provider for testing
//!
//! Provides a configurable mock provider that can simulate per-call
//! failures and successful syntheses, and records every request it sees.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SpeechError};
use crate::provider::{AudioFormat, SpeechAudio, SpeechProvider, SpeechRequest};

/// A mock provider for testing partial-failure behavior
pub struct MockProvider {
    /// 1-based call numbers that fail
    failing_calls: BTreeSet<usize>,
    /// Fail every call regardless of `failing_calls`
    fail_all: bool,
    /// Error to return on failure
    fail_with: SpeechError,
    /// Current call count
    call_count: AtomicUsize,
    /// Every request received, in order
    requests: Mutex<Vec<SpeechRequest>>,
    /// Audio bytes returned on success; the request text is appended
    audio_prefix: Vec<u8>,
    /// Languages rejected by `check_language`
    rejected_languages: Vec<String>,
}

impl MockProvider {
    /// Create a provider that always succeeds
    pub fn always_succeeds() -> Self {
        Self {
            failing_calls: BTreeSet::new(),
            fail_all: false,
            fail_with: SpeechError::NoAudio,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            audio_prefix: b"MOCK:".to_vec(),
            rejected_languages: Vec::new(),
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: SpeechError) -> Self {
        Self {
            fail_all: true,
            fail_with: error,
            ..Self::always_succeeds()
        }
    }

    /// Create a provider that fails on the given 1-based call numbers
    pub fn fails_on_calls(calls: &[usize], error: SpeechError) -> Self {
        Self {
            failing_calls: calls.iter().copied().collect(),
            fail_with: error,
            ..Self::always_succeeds()
        }
    }

    /// Reject a language code in `check_language`
    pub fn rejecting_language(mut self, language: &str) -> Self {
        self.rejected_languages.push(language.to_string());
        self
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get a copy of every request received so far
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());

        if self.fail_all || self.failing_calls.contains(&call_num) {
            return Err(clone_error(&self.fail_with));
        }

        let mut bytes = self.audio_prefix.clone();
        bytes.extend_from_slice(request.text.as_bytes());

        Ok(SpeechAudio {
            bytes,
            format: AudioFormat::Mp3,
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    fn check_language(&self, language: &str) -> Result<()> {
        if self.rejected_languages.iter().any(|l| l == language) {
            return Err(SpeechError::UnsupportedLanguage(language.to_string()));
        }
        Ok(())
    }
}

/// Clone a SpeechError (SpeechError doesn't implement Clone)
fn clone_error(err: &SpeechError) -> SpeechError {
    match err {
        SpeechError::UnsupportedLanguage(s) => SpeechError::UnsupportedLanguage(s.clone()),
        SpeechError::EmptyText => SpeechError::EmptyText,
        SpeechError::RequestFailed(s) => SpeechError::RequestFailed(s.clone()),
        SpeechError::ApiError {
            message,
            status_code,
        } => SpeechError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        SpeechError::NoAudio => SpeechError::NoAudio,
        SpeechError::Decode(s) => SpeechError::Decode(s.clone()),
        SpeechError::ConfigError(s) => SpeechError::ConfigError(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest::new(text, "en")
    }

    #[tokio::test]
    async fn test_always_succeeds() {
        let provider = MockProvider::always_succeeds();

        let result = provider.synthesize(&request("hello")).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().bytes, b"MOCK:hello");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let provider = MockProvider::always_fails(SpeechError::RequestFailed(
            "connection reset".to_string(),
        ));

        for _ in 0..3 {
            let result = provider.synthesize(&request("test")).await;
            assert!(matches!(result, Err(SpeechError::RequestFailed(_))));
        }
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_on_selected_calls() {
        let provider = MockProvider::fails_on_calls(
            &[2, 3],
            SpeechError::ApiError {
                message: "too many requests".to_string(),
                status_code: Some(429),
            },
        );

        assert!(provider.synthesize(&request("one")).await.is_ok());
        assert!(provider.synthesize(&request("two")).await.is_err());
        assert!(provider.synthesize(&request("three")).await.is_err());
        assert!(provider.synthesize(&request("four")).await.is_ok());

        let texts: Vec<String> = provider.requests().into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_rejecting_language() {
        let provider = MockProvider::always_succeeds().rejecting_language("xx");
        assert!(provider.check_language("en").is_ok());
        assert!(provider.check_language("xx").is_err());
    }
}
