//! Conversion pipeline: drives a run through its stages and builds the report.

pub mod report;
pub mod stage;

pub use report::{AssemblyStatus, CleanupFailure, ConversionReport, ConversionResult, ItemFailure};
pub use stage::Stage;

use crate::audio::{Assembler, AssemblyOutcome, Capabilities};
use crate::error::{ConvertError, Result};
use crate::pdf::{self, Document, PageExtractor, PageRange};
use crate::text;
use crate::tts::{AudioSegment, SynthesisProgress, SynthesisStage, TtsOptions};
use chrono::Utc;
use log::{debug, error, info, warn};
use speech_client::SpeechProvider;
use std::path::{Path, PathBuf};

/// Everything a run needs to know about what to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub pdf_path: PathBuf,
    pub output_dir: PathBuf,
    pub language: String,
    pub slow: bool,
    /// Merge parts into one file when possible
    pub merge_files: bool,
    /// Delete parts after a successful merge
    pub cleanup_parts: bool,
    pub chunk_size: usize,
    pub min_line_length: usize,
    pub page_range: Option<PageRange>,
}

#[cfg(test)]
impl ConvertOptions {
    pub fn new(pdf_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pdf_path: pdf_path.into(),
            output_dir: output_dir.into(),
            language: "en".to_string(),
            slow: false,
            merge_files: true,
            cleanup_parts: true,
            chunk_size: text::DEFAULT_MAX_CHUNK_SIZE,
            min_line_length: text::DEFAULT_MIN_LINE_LENGTH,
            page_range: None,
        }
    }
}

/// File name of the merged audiobook.
pub fn merged_file_name(book_name: &str, extension: &str) -> String {
    format!("{}_complete_audiobook.{}", book_name, extension)
}

/// One conversion run.
pub struct Pipeline<'a> {
    options: ConvertOptions,
    capabilities: Capabilities,
    extractor: &'a dyn PageExtractor,
    provider: &'a dyn SpeechProvider,
    assembler: &'a dyn Assembler,
    stage: Stage,
    stages: Vec<Stage>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        options: ConvertOptions,
        capabilities: Capabilities,
        extractor: &'a dyn PageExtractor,
        provider: &'a dyn SpeechProvider,
        assembler: &'a dyn Assembler,
    ) -> Self {
        Self {
            options,
            capabilities,
            extractor,
            provider,
            assembler,
            stage: Stage::Init,
            stages: vec![Stage::Init],
        }
    }

    fn advance(&mut self, next: Stage) {
        if !self.stage.can_advance_to(next) {
            warn!("Unexpected stage transition {} -> {}", self.stage, next);
        }
        debug!("Stage: {} -> {}", self.stage, next);
        self.stage = next;
        self.stages.push(next);
    }

    /// Run every stage. On error the pipeline ends in `Stage::Failed`.
    pub async fn run(
        &mut self,
        on_progress: impl FnMut(&SynthesisProgress),
    ) -> Result<ConversionReport> {
        match self.execute(on_progress).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Conversion failed during {}: {}", self.stage, e);
                if !self.stage.is_terminal() {
                    self.advance(Stage::Failed);
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &mut self,
        on_progress: impl FnMut(&SynthesisProgress),
    ) -> Result<ConversionReport> {
        let started_at = Utc::now();
        let options = self.options.clone();

        // Init
        pdf::validate_input(&options.pdf_path)?;
        self.provider
            .check_language(&options.language)
            .map_err(|_| ConvertError::UnsupportedLanguage(options.language.clone()))?;
        std::fs::create_dir_all(&options.output_dir).map_err(|source| ConvertError::OutputDir {
            path: options.output_dir.clone(),
            source,
        })?;

        self.advance(Stage::Extracting);
        info!("Extracting text from PDF: {}", options.pdf_path.display());
        let extraction = self.extractor.extract(&options.pdf_path, options.page_range)?;
        let document = Document::new(&options.pdf_path, extraction);
        for failure in &document.page_failures {
            warn!("Skipped page {}: {}", failure.index, failure.reason);
        }
        let raw = document.raw_text();
        if raw.is_empty() {
            return Err(ConvertError::ExtractionFailed("no text extracted".to_string()));
        }
        info!(
            "Extracted {} characters (~{} words) from {} pages",
            raw.chars().count(),
            document.total_words(),
            document.pages.len()
        );

        self.advance(Stage::Normalizing);
        let normalized = text::normalize(&raw, options.min_line_length);
        if normalized.is_empty() {
            return Err(ConvertError::ExtractionFailed(
                "no readable text after normalization".to_string(),
            ));
        }

        self.advance(Stage::Segmenting);
        let chunks = text::chunk_document(&normalized, options.chunk_size);
        info!("Text split into {} chunks", chunks.len());

        self.advance(Stage::Synthesizing);
        let book_name = document.book_name();
        let tts_options = TtsOptions::new()
            .with_language(options.language.as_str())
            .with_slow(options.slow);
        let synthesis = SynthesisStage::new(
            self.provider,
            &options.output_dir,
            &book_name,
            tts_options,
        )
        .synthesize(&chunks, on_progress)
        .await;

        let segments = synthesis.segments();
        if segments.is_empty() {
            return Err(ConvertError::SynthesisFailed {
                attempted: synthesis.attempted(),
            });
        }

        let (assembly, result) = if !options.merge_files {
            (AssemblyStatus::Skipped("merging disabled".to_string()), None)
        } else if segments.len() < 2 {
            (AssemblyStatus::Skipped("single part".to_string()), None)
        } else if !self.assembler.merges() {
            info!("ffmpeg not available, keeping separate audio files");
            (
                AssemblyStatus::Skipped("audio merge unavailable".to_string()),
                None,
            )
        } else {
            self.advance(Stage::Assembling);
            self.assemble(&book_name, &segments)
        };

        let mut cleanup_failures = Vec::new();
        let result = match result {
            Some(merged) => {
                if options.cleanup_parts {
                    self.advance(Stage::CleaningUp);
                    cleanup_failures = remove_parts(&segments);
                }
                ConversionResult::Merged(merged)
            }
            None => ConversionResult::Parts(segments.iter().map(|s| s.path.clone()).collect()),
        };

        self.advance(Stage::Done);

        Ok(ConversionReport {
            book_name,
            source: options.pdf_path.clone(),
            page_count: document.page_count,
            pages_read: document.pages.len(),
            page_failures: document.page_failures.clone(),
            raw_chars: raw.chars().count(),
            normalized_chars: normalized.chars().count(),
            chunk_count: chunks.len(),
            chunks_synthesized: synthesis.succeeded(),
            chunk_failures: synthesis.failures(),
            assembly,
            cleanup_failures,
            capabilities: self.capabilities.list(),
            stages: self.stages.clone(),
            started_at,
            finished_at: Utc::now(),
            result,
        })
    }

    fn assemble(
        &self,
        book_name: &str,
        segments: &[AudioSegment],
    ) -> (AssemblyStatus, Option<PathBuf>) {
        let extension = self.provider.format().extension();
        let output = self
            .options
            .output_dir
            .join(merged_file_name(book_name, extension));

        match self.assembler.assemble(segments, &output) {
            AssemblyOutcome::Merged(path) => (AssemblyStatus::Merged, Some(path)),
            AssemblyOutcome::Unmerged => (
                AssemblyStatus::Skipped(format!("{} did not merge", self.assembler.name())),
                None,
            ),
            AssemblyOutcome::Failed(reason) => {
                warn!("Keeping separate audio files");
                (AssemblyStatus::Failed(reason), None)
            }
        }
    }
}

/// Delete merged parts. Failures are logged and returned, never fatal.
fn remove_parts(segments: &[AudioSegment]) -> Vec<CleanupFailure> {
    let mut failures = Vec::new();

    for segment in segments {
        if let Err(source) = std::fs::remove_file(&segment.path) {
            let reason = source.to_string();
            warn!(
                "{}",
                ConvertError::CleanupFailed {
                    path: segment.path.clone(),
                    source
                }
            );
            failures.push(CleanupFailure {
                path: segment.path.clone(),
                reason,
            });
        }
    }

    if failures.is_empty() {
        info!("Individual part files cleaned up");
    }
    failures
}

/// Human-readable location of the result, for the final summary line.
pub fn describe_result(result: &ConversionResult, output_dir: &Path) -> String {
    match result {
        ConversionResult::Merged(path) => format!("Audiobook saved as: {}", path.display()),
        ConversionResult::Parts(paths) => format!(
            "{} audio file(s) saved in: {}",
            paths.len(),
            output_dir.display()
        ),
    }
}

#[cfg(test)]
impl Pipeline<'_> {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}
