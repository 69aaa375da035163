//! Chapter summarization: backend calls with retry, timeout, and
//! hierarchical reduction for oversized chapters.

use log::{debug, warn};
use std::time::Duration;
use thiserror::Error;

use summarizer_client::{BackendError, SummaryBackend, SummaryRequest};

use crate::segment::Chapter;
use crate::text::{self, chunker};
use crate::text::chunker::InvalidChunkSize;

const SYSTEM_PROMPT: &str = "You are an assistant that summarizes chapters of a document.";
const TEMPERATURE: f32 = 0.3;

/// Recorded for chapters whose body is empty; no backend call is made.
pub const EMPTY_CHAPTER_SUMMARY: &str = "No content to summarize.";

/// Note attached to results whose input had to be cut at the depth limit.
pub const TRUNCATION_NOTE: &str = "summary input truncated at maximum reduction depth";

#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    /// Upper bound on text size per backend call, in bytes
    pub max_chunk_size: usize,
    /// Additional attempts after the first failure
    pub retry_attempts: u32,
    /// Fixed sleep between attempts
    pub retry_backoff: Duration,
    /// How many reduction passes before giving up and truncating
    pub max_reduction_depth: u32,
    /// Per-call timeout; an elapsed timeout counts as backend unavailable
    pub request_timeout: Duration,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: 4000,
            retry_attempts: 1,
            retry_backoff: Duration::from_millis(500),
            max_reduction_depth: 3,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// A finished chapter summary.
#[derive(Debug, Clone)]
pub struct ChapterSummary {
    pub text: String,
    /// Input was cut at the reduction depth limit
    pub truncated: bool,
}

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    InvalidChunkSize(#[from] InvalidChunkSize),
}

/// Drives summarization calls against a backend.
pub struct Summarizer {
    backend: Box<dyn SummaryBackend>,
    options: SummarizeOptions,
}

impl Summarizer {
    pub fn new(backend: Box<dyn SummaryBackend>, options: SummarizeOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &SummarizeOptions {
        &self.options
    }

    /// Summarize one chapter, reducing hierarchically if the body exceeds the
    /// chunk budget. Empty chapters are reported without a backend call.
    pub async fn summarize_chapter(&self, chapter: &Chapter) -> Result<ChapterSummary, SummarizeError> {
        if chapter.body.trim().is_empty() {
            debug!("Chapter \"{}\" has no content", chapter.title);
            return Ok(ChapterSummary {
                text: EMPTY_CHAPTER_SUMMARY.to_string(),
                truncated: false,
            });
        }

        debug!(
            "Summarizing chapter \"{}\" ({} bytes)",
            chapter.title,
            chapter.body.len()
        );

        if chapter.body.len() <= self.options.max_chunk_size {
            let summary = self.call_with_retry(&chapter.body).await?;
            return Ok(ChapterSummary {
                text: summary,
                truncated: false,
            });
        }

        // First pass: summarize each chunk of the body independently, in
        // (chapter, index) order.
        let chunks = text::process_chapter(chapter, self.options.max_chunk_size)?;
        debug!("Chapter \"{}\" split into {} chunks", chapter.title, chunks.len());

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            debug!("Summarizing chunk {}.{}", chunk.chapter_order, chunk.index);
            partials.push(self.call_with_retry(&chunk.text).await?);
        }

        // Second pass: summarize the concatenated chunk summaries.
        self.reduce(&partials.join("\n"), 1).await
    }

    /// One reduction pass: text that fits gets a single call; oversized text
    /// is chunked, each chunk summarized, and the joined summaries reduced
    /// again until they fit or the depth limit is reached.
    async fn reduce(&self, text: &str, depth: u32) -> Result<ChapterSummary, SummarizeError> {
        if text.len() <= self.options.max_chunk_size {
            let summary = self.call_with_retry(text).await?;
            return Ok(ChapterSummary {
                text: summary,
                truncated: false,
            });
        }

        if depth >= self.options.max_reduction_depth {
            warn!(
                "Reduction depth {} reached with {} bytes left; truncating",
                depth,
                text.len()
            );
            let truncated: String = text.chars().take(self.options.max_chunk_size).collect();
            let summary = self.call_with_retry(&truncated).await?;
            return Ok(ChapterSummary {
                text: summary,
                truncated: true,
            });
        }

        let chunks = chunker::chunk_text(text, self.options.max_chunk_size)?;
        debug!("Reduction pass {}: {} chunks", depth, chunks.len());

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            partials.push(self.call_with_retry(chunk).await?);
        }

        let combined = partials.join("\n");
        Box::pin(self.reduce(&combined, depth + 1)).await
    }

    /// Call the backend, retrying failed attempts with fixed backoff.
    async fn call_with_retry(&self, text: &str) -> Result<String, SummarizeError> {
        let mut attempt = 0;
        loop {
            match self.call_once(text).await {
                Ok(summary) => return Ok(summary),
                Err(e) if attempt < self.options.retry_attempts => {
                    attempt += 1;
                    warn!(
                        "Backend call failed ({}); retry {}/{}",
                        e, attempt, self.options.retry_attempts
                    );
                    tokio::time::sleep(self.options.retry_backoff).await;
                }
                Err(e) => return Err(SummarizeError::Backend(e)),
            }
        }
    }

    /// One backend call, bounded by the configured timeout.
    async fn call_once(&self, text: &str) -> Result<String, BackendError> {
        let request = SummaryRequest {
            text: format!(
                "Summarize the following chapter content:\n\n{}\n\nSummary:",
                text
            ),
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            temperature: Some(TEMPERATURE),
        };

        let response = tokio::time::timeout(
            self.options.request_timeout,
            self.backend.summarize(request),
        )
        .await
        .map_err(|_| BackendError::Unavailable {
            message: format!(
                "request timed out after {}s",
                self.options.request_timeout.as_secs()
            ),
        })??;

        let content = response.content.trim();
        if content.is_empty() {
            return Err(BackendError::BadResponse {
                message: "empty summary".to_string(),
            });
        }

        Ok(content.to_string())
    }
}

impl SummarizeError {
    /// Whether the underlying failure was the backend being unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SummarizeError::Backend(e) if e.is_unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use summarizer_client::MockBackend;

    fn chapter(body: &str) -> Chapter {
        Chapter {
            title: "Test Chapter".to_string(),
            body: body.to_string(),
            order: 0,
        }
    }

    fn options(max_chunk_size: usize) -> SummarizeOptions {
        SummarizeOptions {
            max_chunk_size,
            retry_attempts: 1,
            retry_backoff: Duration::from_millis(1),
            max_reduction_depth: 3,
            request_timeout: Duration::from_secs(5),
        }
    }

    fn unavailable() -> BackendError {
        BackendError::Unavailable {
            message: "connection refused".to_string(),
        }
    }

    #[tokio::test]
    async fn test_small_chapter_single_call() {
        let backend = MockBackend::always_succeeds("a summary");
        let summarizer = Summarizer::new(Box::new(backend), options(1000));

        let summary = summarizer
            .summarize_chapter(&chapter("Short body text."))
            .await
            .unwrap();
        assert_eq!(summary.text, "a summary");
        assert!(!summary.truncated);
    }

    #[tokio::test]
    async fn test_empty_chapter_skips_backend() {
        let summarizer = Summarizer::new(
            Box::new(MockBackend::always_fails(unavailable())),
            options(1000),
        );

        let summary = summarizer.summarize_chapter(&chapter("")).await.unwrap();
        assert_eq!(summary.text, EMPTY_CHAPTER_SUMMARY);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let backend = MockBackend::fails_then_succeeds(1, unavailable(), "recovered");
        let summarizer = Summarizer::new(Box::new(backend), options(1000));

        let summary = summarizer
            .summarize_chapter(&chapter("Some text."))
            .await
            .unwrap();
        assert_eq!(summary.text, "recovered");
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let backend = MockBackend::always_fails(unavailable());
        let summarizer = Summarizer::new(Box::new(backend), options(1000));

        let err = summarizer
            .summarize_chapter(&chapter("Some text."))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_oversized_chapter_reduced_hierarchically() {
        // Body needs chunking; short mock summaries make the second pass fit.
        let body = "First sentence here. Second sentence here. Third sentence here. \
                    Fourth sentence here. Fifth sentence here. Sixth sentence here.";
        let backend = MockBackend::always_succeeds("s");
        let summarizer = Summarizer::new(Box::new(backend), options(40));

        let summary = summarizer.summarize_chapter(&chapter(body)).await.unwrap();
        assert_eq!(summary.text, "s");
        assert!(!summary.truncated);
    }

    #[tokio::test]
    async fn test_reduction_depth_exhaustion_truncates() {
        // Mock summaries are longer than the budget, so reduction never
        // converges and the depth limit kicks in.
        let long_response = "word ".repeat(20);
        let body = "One sentence. ".repeat(20);
        let backend = MockBackend::always_succeeds(&long_response);
        let summarizer = Summarizer::new(
            Box::new(backend),
            SummarizeOptions {
                max_reduction_depth: 2,
                ..options(30)
            },
        );

        let summary = summarizer.summarize_chapter(&chapter(&body)).await.unwrap();
        assert!(summary.truncated);
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let backend =
            MockBackend::always_succeeds("late").with_delay(Duration::from_millis(200));
        let summarizer = Summarizer::new(
            Box::new(backend),
            SummarizeOptions {
                retry_attempts: 0,
                request_timeout: Duration::from_millis(10),
                ..options(1000)
            },
        );

        let err = summarizer
            .summarize_chapter(&chapter("Some text."))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_empty_backend_response_is_bad_response() {
        let backend = MockBackend::always_succeeds("   ");
        let summarizer = Summarizer::new(
            Box::new(backend),
            SummarizeOptions {
                retry_attempts: 0,
                ..options(1000)
            },
        );

        let err = summarizer
            .summarize_chapter(&chapter("Some text."))
            .await
            .unwrap_err();
        assert!(!err.is_unavailable());
    }
}
