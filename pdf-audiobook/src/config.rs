//! pdf-audiobook configuration management.

use crate::text::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_LINE_LENGTH};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use speech_client::ProviderKind;
use std::fs;
use std::path::PathBuf;

const DEFAULT_OUTPUT_DIR: &str = "audiobooks";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_TLD: &str = "com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudiobookConfig {
    /// Directory for generated audio files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Language code for speech (e.g. "en", "fr")
    #[serde(default = "default_language")]
    pub language: String,

    /// Speak slowly
    #[serde(default)]
    pub slow: bool,

    /// Merge parts into one file when ffmpeg is available
    #[serde(default = "default_true")]
    pub merge_files: bool,

    /// Delete parts after a successful merge
    #[serde(default = "default_true")]
    pub cleanup_parts: bool,

    /// Maximum characters per speech chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Lines this short or shorter are dropped as headers and page numbers
    #[serde(default = "default_min_line_length")]
    pub min_line_length: usize,

    /// Speech backend
    #[serde(default)]
    pub provider: ProviderKind,

    /// Top-level domain of the speech endpoint (e.g. "com", "co.uk")
    #[serde(default = "default_tld")]
    pub tld: String,

    /// HTTP timeout per speech request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// pdfium library file or the directory containing it
    #[serde(default)]
    pub pdfium_path: Option<PathBuf>,

    /// ffmpeg executable. None means search PATH.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    DEFAULT_MAX_CHUNK_SIZE
}

fn default_min_line_length() -> usize {
    DEFAULT_MIN_LINE_LENGTH
}

fn default_tld() -> String {
    DEFAULT_TLD.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AudiobookConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            language: default_language(),
            slow: false,
            merge_files: true,
            cleanup_parts: true,
            chunk_size: default_chunk_size(),
            min_line_length: default_min_line_length(),
            provider: ProviderKind::default(),
            tld: default_tld(),
            request_timeout_secs: default_request_timeout_secs(),
            pdfium_path: None,
            ffmpeg_path: None,
        }
    }
}

impl AudiobookConfig {
    /// Get the config file path: ~/.config/cli-programs/pdf-audiobook.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("pdf-audiobook.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: AudiobookConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}
