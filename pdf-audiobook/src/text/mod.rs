//! Text processing module for TTS: normalization and sentence-preserving chunking.

pub mod chunker;
pub mod cleaner;

pub use chunker::{DEFAULT_MAX_CHUNK_SIZE, chunk_document};
pub use cleaner::{DEFAULT_MIN_LINE_LENGTH, normalize};

/// A chunk of text ready for TTS processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 1-based position in the document
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
