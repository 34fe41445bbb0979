//! Text normalization for TTS processing.

/// Blocks at or below this many characters are treated as page artifacts.
pub const DEFAULT_MIN_LINE_LENGTH: usize = 10;

/// Typographic characters and their ASCII replacements.
const PROBLEMATIC_CHARS: &[(char, char)] = &[
    ('\u{2018}', '\''), // Left single quote
    ('\u{2019}', '\''), // Right single quote
    ('\u{201c}', '"'),  // Left double quote
    ('\u{201d}', '"'),  // Right double quote
    ('\u{2013}', '-'),  // En dash
    ('\u{2014}', '-'),  // Em dash
];

/// Normalize raw PDF text for TTS processing.
///
/// This function:
/// - Groups the text into blocks separated by blank lines (page breaks
///   included); lines wrapped inside a block stay together
/// - Collapses whitespace runs, line breaks included, into single spaces
/// - Replaces curly quotes and en/em dashes with ASCII equivalents
/// - Drops blocks no longer than `min_line_length` (standalone page numbers,
///   running headers)
/// - Joins the remaining blocks with single spaces
pub fn normalize(raw_text: &str, min_line_length: usize) -> String {
    blocks(raw_text)
        .into_iter()
        .map(|block| replace_problematic_chars(&collapse_whitespace(&block)))
        .filter(|block| block.chars().count() > min_line_length)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split on blank lines, keeping the line breaks inside each block.
fn blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Collapse every whitespace run into one space and trim the ends.
fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn replace_problematic_chars(text: &str) -> String {
    text.chars()
        .map(|c| {
            PROBLEMATIC_CHARS
                .iter()
                .find(|(ch, _)| *ch == c)
                .map(|(_, r)| *r)
                .unwrap_or(c)
        })
        .collect()
}
