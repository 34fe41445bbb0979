//! Error kinds of a conversion run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("PDF file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium for your platform, then either:\n\
  • set PDFIUM_LIB_PATH=/directory/containing/libpdfium, or\n\
  • set pdfium_path in the configuration file.\n"
    )]
    PdfiumUnavailable(String),

    #[error("Speech synthesis failed: no audio produced ({attempted} chunk(s) attempted)")]
    SynthesisFailed { attempted: usize },

    #[error("Audio assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("Could not delete {}: {source}", path.display())]
    CleanupFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unsupported language '{0}'. Run 'pdf-audio languages' to list supported codes")]
    UnsupportedLanguage(String),

    #[error("Invalid page range '{0}'. Use 'start-end' (e.g., '3-10') or a single page number")]
    InvalidPageRange(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = ConvertError::InputNotFound {
            path: PathBuf::from("/books/missing.pdf"),
        };
        assert_eq!(err.to_string(), "PDF file not found: /books/missing.pdf");
    }

    #[test]
    fn test_synthesis_failed_message() {
        let err = ConvertError::SynthesisFailed { attempted: 4 };
        assert!(err.to_string().contains("no audio produced"));
        assert!(err.to_string().contains("4 chunk(s)"));
    }
}
