//! Google Translate speech provider
//!
//! Talks to the same `batchexecute` endpoint the Translate web UI uses. The
//! endpoint only accepts short snippets, so each request is split on word
//! boundaries into pieces of at most 100 characters. Every piece comes back
//! as a base64 MP3 frame sequence; the decoded pieces are concatenated.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use regex::Regex;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{Result, SpeechError};
use crate::languages;
use crate::provider::{AudioFormat, SpeechAudio, SpeechProvider, SpeechRequest};

/// RPC identifier of the text-to-speech call.
const RPC_ID: &str = "jQ1olc";

/// Longest snippet the endpoint accepts in one call.
pub const MAX_REQUEST_CHARS: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

static AUDIO_LINE: OnceLock<Regex> = OnceLock::new();

fn audio_line_regex() -> &'static Regex {
    AUDIO_LINE.get_or_init(|| {
        Regex::new(r#"jQ1olc","\[\\"(.*)\\"]"#).expect("audio line pattern should compile")
    })
}

/// Provider for the Google Translate speech endpoint
pub struct GoogleTranslateProvider {
    tld: String,
    client: Client,
}

impl GoogleTranslateProvider {
    /// Create a provider for `translate.google.<tld>`
    pub fn new(tld: &str, timeout: Duration) -> Result<Self> {
        let tld = tld.trim().trim_start_matches('.');
        if tld.is_empty() {
            return Err(SpeechError::ConfigError(
                "top-level domain must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SpeechError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            tld: tld.to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://translate.google.{}/_/TranslateWebserverUi/data/batchexecute",
            self.tld
        )
    }

    async fn synthesize_piece(&self, text: &str, language: &str, slow: bool) -> Result<Vec<u8>> {
        let body = package_rpc(text, language, slow);

        let response = self
            .client
            .post(self.endpoint())
            .header("Referer", format!("http://translate.google.{}/", self.tld))
            .form(&[("f.req", body)])
            .send()
            .await
            .map_err(|e| SpeechError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SpeechError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(SpeechError::ApiError {
                message: body.chars().take(200).collect(),
                status_code: Some(status.as_u16()),
            });
        }

        extract_audio(&body)
    }
}

/// Build the `f.req` form value for one snippet.
fn package_rpc(text: &str, language: &str, slow: bool) -> String {
    let speed = if slow { Value::Bool(true) } else { Value::Null };
    let parameter = json!([text, language, speed, "null"]).to_string();
    json!([[[RPC_ID, parameter, Value::Null, "generic"]]]).to_string()
}

/// Pull the base64 audio out of a `batchexecute` response body.
fn extract_audio(body: &str) -> Result<Vec<u8>> {
    for line in body.lines().filter(|l| l.contains(RPC_ID)) {
        if let Some(captures) = audio_line_regex().captures(line) {
            return STANDARD
                .decode(&captures[1])
                .map_err(|e| SpeechError::Decode(e.to_string()));
        }
    }
    Err(SpeechError::NoAudio)
}

/// Split text into snippets of at most `max_chars` characters on word
/// boundaries. Words longer than the limit are cut. Snippets without any
/// alphanumeric character are dropped since the endpoint rejects them.
pub fn split_for_requests(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            pieces.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces.retain(|p| p.chars().any(char::is_alphanumeric));
    pieces
}

#[async_trait]
impl SpeechProvider for GoogleTranslateProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SpeechAudio> {
        self.check_language(&request.language)?;

        let pieces = split_for_requests(&request.text, MAX_REQUEST_CHARS);
        if pieces.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let mut bytes = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            debug!("Requesting piece {}/{} ({} chars)", i + 1, pieces.len(), piece.len());
            bytes.extend(
                self.synthesize_piece(piece, &request.language, request.slow)
                    .await?,
            );
        }

        Ok(SpeechAudio {
            bytes,
            format: AudioFormat::Mp3,
        })
    }

    fn name(&self) -> &'static str {
        "Google Translate"
    }

    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    fn check_language(&self, language: &str) -> Result<()> {
        if languages::is_supported(language) {
            Ok(())
        } else {
            Err(SpeechError::UnsupportedLanguage(language.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_rpc_normal_speed() {
        let rpc = package_rpc("Hello.", "en", false);
        assert_eq!(
            rpc,
            r#"[[["jQ1olc","[\"Hello.\",\"en\",null,\"null\"]",null,"generic"]]]"#
        );
    }

    #[test]
    fn test_package_rpc_slow() {
        let rpc = package_rpc("Hi", "de", true);
        assert!(rpc.contains(r#"\"de\",true,\"null\""#));
    }

    #[test]
    fn test_extract_audio() {
        let encoded = STANDARD.encode(b"ID3fake-mp3");
        let body = format!(
            ")]}}'\n\n123\n[[\"wrb.fr\",\"jQ1olc\",\"[\\\"{}\\\"]\",null,null,null,\"generic\"]]\n",
            encoded
        );
        let audio = extract_audio(&body).unwrap();
        assert_eq!(audio, b"ID3fake-mp3");
    }

    #[test]
    fn test_extract_audio_missing() {
        let body = ")]}'\n\n[[\"wrb.fr\",\"jQ1olc\",null,null,null,[3],\"generic\"]]";
        assert!(matches!(extract_audio(body), Err(SpeechError::NoAudio)));
    }

    #[test]
    fn test_split_short_text() {
        assert_eq!(split_for_requests("Hello world.", 100), vec!["Hello world."]);
    }

    #[test]
    fn test_split_respects_limit() {
        let text = "one two three four five six seven";
        let pieces = split_for_requests(text, 10);
        assert_eq!(pieces, vec!["one two", "three four", "five six", "seven"]);
        assert!(pieces.iter().all(|p| p.chars().count() <= 10));
    }

    #[test]
    fn test_split_long_word() {
        let pieces = split_for_requests("abcdefghij k", 4);
        assert_eq!(pieces, vec!["abcd", "efgh", "ij", "k"]);
    }

    #[test]
    fn test_split_drops_punctuation_only() {
        assert!(split_for_requests(" - ... ", 100).is_empty());
    }

    #[test]
    fn test_empty_tld_rejected() {
        let result = GoogleTranslateProvider::new(" ", Duration::from_secs(5));
        assert!(matches!(result, Err(SpeechError::ConfigError(_))));
    }

    #[test]
    fn test_endpoint_uses_tld() {
        let provider = GoogleTranslateProvider::new(".co.uk", Duration::from_secs(5)).unwrap();
        assert_eq!(
            provider.endpoint(),
            "https://translate.google.co.uk/_/TranslateWebserverUi/data/batchexecute"
        );
    }

    #[test]
    fn test_check_language() {
        let provider = GoogleTranslateProvider::new("com", Duration::from_secs(5)).unwrap();
        assert!(provider.check_language("fr").is_ok());
        assert!(matches!(
            provider.check_language("klingon"),
            Err(SpeechError::UnsupportedLanguage(_))
        ));
    }
}
