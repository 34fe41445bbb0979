//! Speech synthesis stage: one provider call per chunk, one file per success.

use crate::pipeline::ItemFailure;
use crate::text::TextChunk;
use log::{error, info};
use speech_client::{SpeechError, SpeechProvider, SpeechRequest};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Options passed through to the speech provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsOptions {
    /// Language code (e.g. "en", "fr", "zh-CN")
    pub language: String,
    /// Speak slowly
    pub slow: bool,
}

impl Default for TtsOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            slow: false,
        }
    }
}

impl TtsOptions {
    /// Create new TTS options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set slow speech.
    pub fn with_slow(mut self, slow: bool) -> Self {
        self.slow = slow;
        self
    }
}

/// Synthesized audio for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    /// Index of the originating chunk
    pub index: usize,
    pub path: PathBuf,
}

#[derive(Error, Debug)]
enum ChunkError {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    pub index: usize,
    pub result: Result<AudioSegment, String>,
}

/// Ordered outcomes of the whole stage.
#[derive(Debug, Clone, Default)]
pub struct SynthesisReport {
    pub outcomes: Vec<ChunkOutcome>,
}

impl SynthesisReport {
    /// Successful segments in chunk order.
    pub fn segments(&self) -> Vec<AudioSegment> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().cloned())
            .collect()
    }

    /// Failed chunks in chunk order.
    pub fn failures(&self) -> Vec<ItemFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.result
                    .as_ref()
                    .err()
                    .map(|reason| ItemFailure::new(o.index, reason.clone()))
            })
            .collect()
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Progress after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisProgress {
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
}

/// File name of one part: `<book>_part_<NNN>.<ext>`.
///
/// The index is zero-padded to three digits, or wider when the total needs
/// it, so files sort in chunk order.
pub fn part_file_name(book_name: &str, index: usize, total: usize, extension: &str) -> String {
    let width = total.to_string().len().max(3);
    format!("{}_part_{:0width$}.{}", book_name, index, extension, width = width)
}

/// Converts chunks to audio files with a speech provider.
pub struct SynthesisStage<'a> {
    provider: &'a dyn SpeechProvider,
    output_dir: &'a Path,
    book_name: &'a str,
    options: TtsOptions,
}

impl<'a> SynthesisStage<'a> {
    pub fn new(
        provider: &'a dyn SpeechProvider,
        output_dir: &'a Path,
        book_name: &'a str,
        options: TtsOptions,
    ) -> Self {
        Self {
            provider,
            output_dir,
            book_name,
            options,
        }
    }

    /// Synthesize every chunk in order. Failed chunks are logged and skipped.
    pub async fn synthesize(
        &self,
        chunks: &[TextChunk],
        mut on_progress: impl FnMut(&SynthesisProgress),
    ) -> SynthesisReport {
        let total = chunks.len();
        let mut report = SynthesisReport::default();
        let mut progress = SynthesisProgress {
            completed: 0,
            total,
            succeeded: 0,
        };

        info!(
            "Starting TTS conversion for {} chunks with {}...",
            total,
            self.provider.name()
        );

        for chunk in chunks {
            info!(
                "Processing chunk {}/{} ({} chars)...",
                chunk.index,
                total,
                chunk.char_len()
            );

            let result = match self.synthesize_chunk(chunk, total).await {
                Ok(segment) => {
                    info!("Saved: {}", segment.path.display());
                    progress.succeeded += 1;
                    Ok(segment)
                }
                Err(e) => {
                    error!("Error converting chunk {} to speech: {}", chunk.index, e);
                    Err(e.to_string())
                }
            };

            report.outcomes.push(ChunkOutcome {
                index: chunk.index,
                result,
            });
            progress.completed += 1;
            on_progress(&progress);
        }

        info!(
            "TTS conversion completed. Generated {} audio files.",
            report.succeeded()
        );
        report
    }

    async fn synthesize_chunk(
        &self,
        chunk: &TextChunk,
        total: usize,
    ) -> Result<AudioSegment, ChunkError> {
        let request = SpeechRequest::new(chunk.text.as_str(), self.options.language.as_str())
            .slow(self.options.slow);
        let audio = self.provider.synthesize(&request).await?;

        let file_name = part_file_name(
            self.book_name,
            chunk.index,
            total,
            audio.format.extension(),
        );
        let path = self.output_dir.join(file_name);

        if let Err(source) = tokio::fs::write(&path, &audio.bytes).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(ChunkError::Write { path, source });
        }

        Ok(AudioSegment {
            index: chunk.index,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speech_client::MockProvider;
    use tempfile::TempDir;

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk::new(i + 1, t.to_string()))
            .collect()
    }

    #[test]
    fn test_tts_options_builder() {
        let opts = TtsOptions::new().with_language("fr").with_slow(true);
        assert_eq!(opts.language, "fr");
        assert!(opts.slow);
        assert_eq!(TtsOptions::default().language, "en");
    }

    #[test]
    fn test_part_file_name_padding() {
        assert_eq!(part_file_name("book", 7, 12, "mp3"), "book_part_007.mp3");
        assert_eq!(part_file_name("book", 42, 999, "mp3"), "book_part_042.mp3");
        assert_eq!(part_file_name("book", 42, 1200, "mp3"), "book_part_0042.mp3");
    }

    #[tokio::test]
    async fn test_all_chunks_written_in_order() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::always_succeeds();
        let stage = SynthesisStage::new(&provider, dir.path(), "novel", TtsOptions::new());

        let report = stage
            .synthesize(&chunks(&["One.", "Two.", "Three."]), |_| {})
            .await;

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 3);
        let segments = report.segments();
        assert_eq!(segments[0].path, dir.path().join("novel_part_001.mp3"));
        assert_eq!(segments[2].index, 3);
        assert_eq!(std::fs::read(&segments[1].path).unwrap(), b"MOCK:Two.");
    }

    #[tokio::test]
    async fn test_failed_chunks_are_skipped() {
        let dir = TempDir::new().unwrap();
        let provider =
            MockProvider::fails_on_calls(&[2], SpeechError::RequestFailed("timeout".to_string()));
        let stage = SynthesisStage::new(&provider, dir.path(), "novel", TtsOptions::new());

        let mut seen = Vec::new();
        let report = stage
            .synthesize(&chunks(&["One.", "Two.", "Three."]), |p| seen.push(*p))
            .await;

        assert_eq!(provider.call_count(), 3);
        let indices: Vec<usize> = report.segments().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].index, 2);
        assert!(!dir.path().join("novel_part_002.mp3").exists());

        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[2],
            SynthesisProgress {
                completed: 3,
                total: 3,
                succeeded: 2
            }
        );
    }

    #[tokio::test]
    async fn test_options_passed_to_provider() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::always_succeeds();
        let options = TtsOptions::new().with_language("de").with_slow(true);
        let stage = SynthesisStage::new(&provider, dir.path(), "buch", options);

        stage.synthesize(&chunks(&["Hallo Welt."]), |_| {}).await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].language, "de");
        assert!(requests[0].slow);
    }

    #[tokio::test]
    async fn test_write_failure_is_per_chunk() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let provider = MockProvider::always_succeeds();
        let stage = SynthesisStage::new(&provider, &missing, "novel", TtsOptions::new());

        let report = stage.synthesize(&chunks(&["One.", "Two."]), |_| {}).await;

        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failures().len(), 2);
        assert!(report.failures()[0].reason.contains("could not write"));
    }
}
