//! Sentence-aware chunking of chapter bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::TextChunk;
use crate::segment::Chapter;

#[derive(Error, Debug)]
#[error("Invalid configuration: max chunk size must be a positive integer")]
pub struct InvalidChunkSize;

/// A sentence ends at terminal punctuation followed by whitespace, with
/// closing quotes/brackets allowed between the two.
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]["')\]]*\s+"#).expect("sentence pattern must compile"));

/// Split text into sentences at terminal punctuation followed by whitespace.
///
/// Text without any terminal punctuation comes back as a single sentence.
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last = 0;

    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[last..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last = m.end();
    }

    let tail = text[last..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Split text into chunks no longer than `max_size`.
///
/// Short text passes through as a single chunk unchanged. Longer text is
/// split at sentence boundaries, accumulating sentences until adding the next
/// one would exceed `max_size`. A single sentence longer than `max_size` is
/// hard-split at the size boundary.
///
/// Invariant: concatenating the chunks in order reproduces the input modulo
/// the whitespace used as separators.
pub fn chunk_text(text: &str, max_size: usize) -> Result<Vec<String>, InvalidChunkSize> {
    if max_size == 0 {
        return Err(InvalidChunkSize);
    }

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    if text.len() <= max_size {
        return Ok(vec![text.to_string()]);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_into_sentences(text) {
        if sentence.len() > max_size {
            // Flush current chunk first
            if !current.is_empty() {
                chunks.push(current);
                current = String::new();
            }
            chunks.extend(hard_split(sentence, max_size));
        } else if current.is_empty() {
            current = sentence.to_string();
        } else if current.len() + sentence.len() + 1 <= max_size {
            current.push(' ');
            current.push_str(sentence);
        } else {
            chunks.push(current);
            current = sentence.to_string();
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}

/// Hard split text at exact character positions (last resort).
fn hard_split(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let chars: Vec<char> = text.chars().collect();

    while start < chars.len() {
        let end = std::cmp::min(start + max_length, chars.len());
        let chunk: String = chars[start..end].iter().collect();
        chunks.push(chunk);
        start = end;
    }

    chunks
}

/// Chunk a chapter's body into ordered `TextChunk`s.
pub fn process_chapter(chapter: &Chapter, max_size: usize) -> Result<Vec<TextChunk>, InvalidChunkSize> {
    let raw_chunks = chunk_text(&chapter.body, max_size)?;

    Ok(raw_chunks
        .into_iter()
        .enumerate()
        .map(|(index, text)| TextChunk::new(chapter.order, index, text))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// All non-whitespace characters, in order
    fn squash(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_short_text_single_chunk_unchanged() {
        let text = "Hello world. How are you?";
        let chunks = chunk_text(text, 280).unwrap();
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_spec_example_split() {
        let chunks = chunk_text("One. Two. Three.", 10).unwrap();
        assert_eq!(chunks, vec!["One. Two.".to_string(), "Three.".to_string()]);
        assert_eq!(squash(&chunks.concat()), squash("One. Two. Three."));
    }

    #[test]
    fn test_long_text_respects_max_size() {
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence. \
                    Fifth sentence. Sixth sentence. Seventh sentence. Eighth sentence.";
        let chunks = chunk_text(text, 50).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 50, "Chunk too long: {} chars", chunk.len());
        }
    }

    #[test]
    fn test_oversized_sentence_hard_split() {
        let text = format!("Short one. {}. Short two.", "x".repeat(100));
        let chunks = chunk_text(&text, 30).unwrap();
        assert!(chunks.iter().all(|c| c.len() <= 30));
        assert_eq!(squash(&chunks.concat()), squash(&text));
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 280).unwrap().is_empty());
        assert!(chunk_text("   \n\n   ", 280).unwrap().is_empty());
    }

    #[test]
    fn test_zero_max_size_rejected() {
        assert!(chunk_text("Some text.", 0).is_err());
    }

    #[test]
    fn test_no_terminal_punctuation_is_one_sentence() {
        let sentences = split_into_sentences("no punctuation here at all");
        assert_eq!(sentences, vec!["no punctuation here at all"]);
    }

    #[test]
    fn test_split_into_sentences() {
        let sentences = split_into_sentences("First one. Second one! Third one?");
        assert_eq!(sentences, vec!["First one.", "Second one!", "Third one?"]);
    }

    #[test]
    fn test_sentence_end_with_closing_quote() {
        let sentences = split_into_sentences("\"Done.\" She left.");
        assert_eq!(sentences, vec!["\"Done.\"", "She left."]);
    }

    #[test]
    fn test_hard_split() {
        let parts = hard_split("abcdefghij", 3);
        assert_eq!(parts, vec!["abc", "def", "ghi", "j"]);
    }

    #[test]
    fn test_process_chapter_ordering() {
        let chapter = Chapter {
            title: "Ch".to_string(),
            body: "First sentence here. Second sentence here. Third sentence here.".to_string(),
            order: 5,
        };
        let chunks = process_chapter(&chapter, 25).unwrap();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chapter_order == 5));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    proptest! {
        // Round-trip: chunk texts concatenated in order reproduce the body
        // modulo separator whitespace.
        #[test]
        fn chunk_round_trip(body in "[a-zA-Z ,.!?\"]{0,400}", max_size in 1usize..80) {
            let chunks = chunk_text(&body, max_size).unwrap();
            let rejoined: String = chunks.concat();
            prop_assert_eq!(squash(&rejoined), squash(&body));
        }

        // ASCII input, so byte length and char count coincide.
        #[test]
        fn chunks_never_exceed_max(body in "[a-z .]{0,300}", max_size in 1usize..60) {
            let chunks = chunk_text(&body, max_size).unwrap();
            for chunk in &chunks {
                prop_assert!(chunk.len() <= max_size, "chunk of {} bytes", chunk.len());
            }
        }
    }
}
