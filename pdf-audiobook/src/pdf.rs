// PDF loading and page text extraction

use crate::error::{ConvertError, Result};
use crate::pipeline::ItemFailure;
use log::{debug, info, warn};
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Separator placed between page texts in the raw document text.
const PAGE_SEPARATOR: &str = "\n\n";

/// Text of one page, or the reason it could not be read
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number
    pub number: usize,
    pub text: std::result::Result<String, String>,
}

impl PageText {
    pub fn ok(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: Ok(text.into()),
        }
    }

    pub fn failed(number: usize, reason: impl Into<String>) -> Self {
        Self {
            number,
            text: Err(reason.into()),
        }
    }
}

/// Everything an extractor read from one file
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Total pages in the file, including unselected ones
    pub page_count: usize,
    /// Selected pages in reading order
    pub pages: Vec<PageText>,
}

/// Source of per-page text. pdfium in production, fakes in tests.
pub trait PageExtractor {
    fn extract(&self, path: &Path, range: Option<PageRange>) -> Result<Extraction>;
}

/// Inclusive, 1-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub first: usize,
    pub last: usize,
}

impl PageRange {
    /// Parse "3-10" or "5".
    pub fn parse(range: &str) -> Result<Self> {
        let invalid = || ConvertError::InvalidPageRange(range.to_string());
        let range_str = range.trim();

        let (first, last) = match range_str.split_once('-') {
            Some((start, end)) => (
                start.trim().parse::<usize>().map_err(|_| invalid())?,
                end.trim().parse::<usize>().map_err(|_| invalid())?,
            ),
            None => {
                let page = range_str.parse::<usize>().map_err(|_| invalid())?;
                (page, page)
            }
        };

        if first == 0 || first > last {
            return Err(invalid());
        }

        Ok(Self { first, last })
    }

    pub fn contains(&self, page: usize) -> bool {
        (self.first..=self.last).contains(&page)
    }
}

/// Extracted PDF document
#[derive(Debug, Clone)]
pub struct Document {
    /// Source file
    pub path: PathBuf,
    /// Total pages in the file
    pub page_count: usize,
    /// Text of every readable page, in order
    pub pages: Vec<String>,
    /// Pages that could not be read
    pub page_failures: Vec<ItemFailure>,
}

impl Document {
    /// Build a document from extractor output, separating failed pages.
    pub fn new(path: &Path, extraction: Extraction) -> Self {
        let mut pages = Vec::new();
        let mut page_failures = Vec::new();

        for page in extraction.pages {
            match page.text {
                Ok(text) => pages.push(text),
                Err(reason) => page_failures.push(ItemFailure::new(page.number, reason)),
            }
        }

        Self {
            path: path.to_path_buf(),
            page_count: extraction.page_count,
            pages,
            page_failures,
        }
    }

    /// All page texts joined by blank lines, trimmed
    pub fn raw_text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR).trim().to_string()
    }

    /// Name used for output files: the PDF file stem
    pub fn book_name(&self) -> String {
        book_name(&self.path)
    }

    /// Word count across all pages (approximate)
    pub fn total_words(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.split_whitespace().count())
            .sum()
    }
}

/// File stem of the PDF, falling back to "audiobook"
pub fn book_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "audiobook".to_string())
}

/// Check that the input exists and starts with the PDF magic bytes
pub fn validate_input(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(ConvertError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut magic = [0u8; 4];
    let mut file = std::fs::File::open(path)?;
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(ConvertError::ExtractionFailed(format!(
            "{} is not a PDF file",
            path.display()
        )));
    }

    Ok(())
}

/// 1-based page numbers to read, in order
fn selected_pages(range: Option<PageRange>, page_count: usize) -> Vec<usize> {
    (1..=page_count)
        .filter(|&number| range.is_none_or(|r| r.contains(number)))
        .collect()
}

/// pdfium-backed extractor
pub struct PdfiumExtractor {
    /// Library file or directory containing it; `None` searches the
    /// working directory, then the system library path
    library_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match &self.library_path {
            Some(path) if path.is_file() => Pdfium::bind_to_library(path),
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ConvertError::PdfiumUnavailable(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PageExtractor for PdfiumExtractor {
    fn extract(&self, path: &Path, range: Option<PageRange>) -> Result<Extraction> {
        let pdfium = self.bind()?;

        let document = pdfium.load_pdf_from_file(path, None).map_err(|e| {
            ConvertError::ExtractionFailed(format!("could not open {}: {:?}", path.display(), e))
        })?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        info!("Processing {} pages...", page_count);

        if let Some(range) = range {
            if range.first > page_count {
                warn!(
                    "Page range {}-{} starts after the last page ({})",
                    range.first, range.last, page_count
                );
            }
        }

        let selected = selected_pages(range, page_count);
        let total = selected.len();
        let mut results = Vec::with_capacity(total);

        for (done, number) in selected.into_iter().enumerate() {
            let text = PdfPageIndex::try_from(number - 1)
                .map_err(|e| format!("page index out of range: {}", e))
                .and_then(|index| pages.get(index).map_err(|e| format!("{:?}", e)))
                .and_then(|page| {
                    page.text()
                        .map(|t| t.all())
                        .map_err(|e| format!("{:?}", e))
                });

            match text {
                Ok(text) => {
                    debug!("Page {}: {} chars", number, text.chars().count());
                    results.push(PageText::ok(number, text));
                }
                Err(reason) => {
                    warn!("Error extracting text from page {}: {}", number, reason);
                    results.push(PageText::failed(number, reason));
                }
            }

            let done = done + 1;
            if done % 10 == 0 || done == total {
                info!("Processed {}/{} pages", done, total);
            }
        }

        Ok(Extraction {
            page_count,
            pages: results,
        })
    }
}
