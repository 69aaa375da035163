//! Text processing module: sentence-aware chunking for backend input limits.

pub mod chunker;

pub use chunker::process_chapter;

/// A bounded-size piece of a chapter's body, ready for summarization.
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The chapter this chunk belongs to
    pub chapter_order: usize,
    /// The chunk index within the chapter
    pub index: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(chapter_order: usize, index: usize, text: String) -> Self {
        Self {
            chapter_order,
            index,
            text,
        }
    }
}
