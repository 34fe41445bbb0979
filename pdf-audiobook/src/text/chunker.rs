//! Sentence-preserving text chunking for TTS processing.

use super::TextChunk;

/// Default maximum chunk size in characters.
///
/// Keeps each synthesis request comfortably under typical backend limits.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4500;

/// Sentence delimiter. Abbreviations such as "Dr. Smith" are split too.
const SENTENCE_DELIMITER: &str = ". ";

/// Split text into chunks of at most `max_chunk_size` characters without
/// breaking sentences.
///
/// Sentences are accumulated greedily. A sentence that is longer than the
/// maximum on its own becomes a single oversized chunk rather than being cut.
pub fn segment(text: &str, max_chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current_chunk = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();

        if !current_chunk.is_empty() && current_len + 1 + sentence_len > max_chunk_size {
            push_trimmed(&mut chunks, &current_chunk);
            current_chunk = sentence.to_string();
            current_len = sentence_len;
        } else {
            if !current_chunk.is_empty() {
                current_chunk.push(' ');
                current_len += 1;
            }
            current_chunk.push_str(&sentence);
            current_len += sentence_len;
        }
    }

    push_trimmed(&mut chunks, &current_chunk);
    chunks
}

/// Split on ". ", keeping the period with the sentence it ends.
fn split_sentences(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split(SENTENCE_DELIMITER).collect();
    let last = parts.len() - 1;

    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            if i < last {
                format!("{}.", part)
            } else {
                part.to_string()
            }
        })
        .collect()
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Segment normalized document text into numbered chunks.
///
/// Chunk indices start at 1.
pub fn chunk_document(text: &str, max_chunk_size: usize) -> Vec<TextChunk> {
    segment(text, max_chunk_size)
        .into_iter()
        .enumerate()
        .map(|(i, text)| TextChunk::new(i + 1, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_short_text() {
        let text = "Hello world. How are you?";
        let chunks = segment(text, DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(chunks, vec!["Hello world. How are you?"]);
    }

    #[test]
    fn test_each_sentence_alone_when_pairs_overflow() {
        let chunks = segment("A. B. C.", 4);
        assert_eq!(chunks, vec!["A.", "B.", "C."]);
    }

    #[test]
    fn test_separator_counts_toward_limit() {
        // "A. B." is exactly 5 characters.
        assert_eq!(segment("A. B. C.", 5), vec!["A. B.", "C."]);
    }

    #[test]
    fn test_chunk_long_text() {
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence. Fifth sentence. Sixth sentence. Seventh sentence. Eighth sentence. Ninth sentence. Tenth sentence.";
        let chunks = segment(text, 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "Chunk too long: {}", chunk);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let long = "x".repeat(30);
        let text = format!("Short one. {} Tail.", long);
        let chunks = segment(&text, 12);
        assert_eq!(
            chunks,
            vec!["Short one.".to_string(), format!("{} Tail.", long)]
        );
        assert!(chunks[1].chars().count() > 12);
    }

    #[test]
    fn test_single_oversized_sentence() {
        let sentence = "This sentence is much longer than the limit allows";
        let chunks = segment(sentence, 10);
        assert_eq!(chunks, vec![sentence]);
    }

    #[test]
    fn test_oversized_sentence_between_short_ones() {
        let text = "Hi. Averyveryverylongsentence. Yo.";
        let chunks = segment(text, 8);
        assert_eq!(chunks, vec!["Hi.", "Averyveryverylongsentence.", "Yo."]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(segment("", DEFAULT_MAX_CHUNK_SIZE).is_empty());
    }

    #[test]
    fn test_chunk_whitespace_only() {
        assert!(segment("   ", DEFAULT_MAX_CHUNK_SIZE).is_empty());
    }

    #[test]
    fn test_abbreviations_split_as_sentences() {
        let chunks = segment("Dr. Smith arrived.", 5);
        assert_eq!(chunks, vec!["Dr.", "Smith arrived."]);
    }

    #[test]
    fn test_limit_counts_characters_not_bytes() {
        // Each sentence is 4 characters but 7 bytes.
        let chunks = segment("\u{00e9}\u{00e9}\u{00e9}. \u{00e9}\u{00e9}\u{00e9}.", 9);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_chunk_document_numbers_from_one() {
        let chunks = chunk_document("One. Two. Three.", 5);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(chunks[2].text, "Three.");
    }

    fn sentence() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,8}", 1..6).prop_map(|words| format!("{}.", words.join(" ")))
    }

    proptest! {
        #[test]
        fn chunks_rejoin_to_input_and_respect_limit(
            sentences in prop::collection::vec(sentence(), 0..30),
            max in 1usize..120,
        ) {
            let text = sentences.join(" ");
            let chunks = segment(&text, max);

            prop_assert_eq!(chunks.join(" "), text.clone());
            for chunk in &chunks {
                let single_sentence = !chunk.contains(SENTENCE_DELIMITER);
                prop_assert!(chunk.chars().count() <= max || single_sentence);
            }
            prop_assert_eq!(segment(&text, max), chunks);
        }
    }
}
