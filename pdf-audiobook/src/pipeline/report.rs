//! Per-item outcomes and the summary of a conversion run.

use super::stage::Stage;
use crate::audio::Capability;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// A recoverable failure of one page, chunk or file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Page number or chunk index (1-based)
    pub index: usize,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// A part file that could not be deleted during cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Final output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "paths")]
pub enum ConversionResult {
    /// One merged audiobook file
    Merged(PathBuf),
    /// Per-chunk files in chunk order
    Parts(Vec<PathBuf>),
}

impl ConversionResult {
    /// Every file that makes up the result.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            Self::Merged(path) => vec![path.clone()],
            Self::Parts(paths) => paths.clone(),
        }
    }
}

/// What happened in the assembly stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum AssemblyStatus {
    /// Merging was not attempted
    Skipped(String),
    /// Segments were merged into one file
    Merged,
    /// The merge failed; parts were kept
    Failed(String),
}

/// Summary of one conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub book_name: String,
    pub source: PathBuf,
    pub page_count: usize,
    pub pages_read: usize,
    pub page_failures: Vec<ItemFailure>,
    pub raw_chars: usize,
    pub normalized_chars: usize,
    pub chunk_count: usize,
    pub chunks_synthesized: usize,
    pub chunk_failures: Vec<ItemFailure>,
    pub assembly: AssemblyStatus,
    pub cleanup_failures: Vec<CleanupFailure>,
    pub capabilities: Vec<Capability>,
    pub stages: Vec<Stage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: ConversionResult,
}

impl ConversionReport {
    /// Wall-clock duration of the run.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
