//! The summarization pipeline: extract paragraphs, segment into chapters,
//! summarize each chapter, and record results in the session store.

use log::{error, info};
use thiserror::Error;

use crate::docx::{self, DocxError};
use crate::segment::{self, SegmentOptions};
use crate::session::{SessionStore, SummaryResult, SummaryStatus};
use crate::summarize::{Summarizer, TRUNCATION_NOTE};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Summarization backend unavailable: every chapter failed")]
    BackendUnavailable,
}

impl From<DocxError> for PipelineError {
    fn from(err: DocxError) -> Self {
        match err {
            DocxError::InvalidFileType(msg) => PipelineError::InvalidFileType(msg),
            DocxError::Malformed(msg) => PipelineError::MalformedDocument(msg),
        }
    }
}

/// Composes segmentation, chunked summarization, and session recording.
pub struct Pipeline<'a> {
    summarizer: Summarizer,
    store: &'a SessionStore,
    segment_options: SegmentOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        summarizer: Summarizer,
        store: &'a SessionStore,
        segment_options: SegmentOptions,
    ) -> Self {
        Self {
            summarizer,
            store,
            segment_options,
        }
    }

    /// Run the pipeline on one document.
    ///
    /// Input and structural errors abort the run with nothing recorded.
    /// Per-chapter backend failures are isolated: the chapter is recorded as
    /// failed and processing continues, so a partial failure still returns
    /// every successful summary. Only when every chapter failed does the run
    /// itself fail with `BackendUnavailable`.
    pub async fn run(
        &self,
        bytes: &[u8],
        filename: &str,
        session_id: &str,
    ) -> Result<Vec<SummaryResult>, PipelineError> {
        if self.summarizer.options().max_chunk_size == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "max chunk size must be a positive integer".to_string(),
            ));
        }
        if !filename.to_lowercase().ends_with(".docx") {
            return Err(PipelineError::InvalidFileType(format!(
                "'{}' is not a .docx file",
                filename
            )));
        }
        if bytes.is_empty() {
            return Err(PipelineError::InvalidFileType("empty upload".to_string()));
        }

        info!("Processing document: {}", filename);
        let paragraphs = docx::extract_paragraphs(bytes)?;
        let chapters = segment::segment(&paragraphs, &self.segment_options);

        // Session exists from here on, even if every chapter fails
        self.store.get_or_create(session_id);

        let mut results = Vec::with_capacity(chapters.len());
        for chapter in &chapters {
            let result = match self.summarizer.summarize_chapter(chapter).await {
                Ok(summary) if summary.truncated => SummaryResult::ok_with_note(
                    chapter.order,
                    chapter.title.clone(),
                    summary.text,
                    TRUNCATION_NOTE.to_string(),
                ),
                Ok(summary) => {
                    SummaryResult::ok(chapter.order, chapter.title.clone(), summary.text)
                }
                Err(e) => {
                    error!("Chapter \"{}\" failed: {}", chapter.title, e);
                    SummaryResult::failed(chapter.order, chapter.title.clone(), e.to_string())
                }
            };

            self.store.append(session_id, result.clone());
            results.push(result);
        }

        let failed = results
            .iter()
            .filter(|r| r.status == SummaryStatus::Failed)
            .count();
        info!(
            "Document done: {} chapters, {} failed",
            results.len(),
            failed
        );

        if !results.is_empty() && failed == results.len() {
            return Err(PipelineError::BackendUnavailable);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::make_docx;
    use crate::summarize::{SummarizeOptions, EMPTY_CHAPTER_SUMMARY};
    use std::time::Duration;
    use summarizer_client::{BackendError, MockBackend};

    fn test_options() -> SummarizeOptions {
        SummarizeOptions {
            retry_attempts: 0,
            retry_backoff: Duration::from_millis(1),
            ..SummarizeOptions::default()
        }
    }

    fn pipeline<'a>(backend: MockBackend, store: &'a SessionStore) -> Pipeline<'a> {
        Pipeline::new(
            Summarizer::new(Box::new(backend), test_options()),
            store,
            SegmentOptions::default(),
        )
    }

    fn two_chapter_doc() -> Vec<u8> {
        make_docx(&[
            (Some("Heading1"), "Intro"),
            (None, "Hello world."),
            (Some("Heading1"), "Chapter 1"),
            (None, "Some long text."),
        ])
    }

    #[tokio::test]
    async fn test_happy_path() {
        let store = SessionStore::new();
        let p = pipeline(MockBackend::always_succeeds("a summary"), &store);

        let results = p.run(&two_chapter_doc(), "book.docx", "s1").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Intro");
        assert_eq!(results[1].title, "Chapter 1");
        assert!(results.iter().all(|r| r.status == SummaryStatus::Ok));
        assert!(results.iter().all(|r| r.summary == "a summary"));

        let session = store.get("s1").unwrap();
        assert_eq!(session.results.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_chapter_is_isolated() {
        let store = SessionStore::new();
        let backend = MockBackend::fails_when_contains(
            "Some long text",
            BackendError::Unavailable {
                message: "connection refused".to_string(),
            },
            "a summary",
        );
        let p = pipeline(backend, &store);

        let results = p.run(&two_chapter_doc(), "book.docx", "s1").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, SummaryStatus::Ok);
        assert_eq!(results[1].status, SummaryStatus::Failed);
        assert!(results[1].error.as_deref().unwrap().contains("unavailable"));
        assert!(results[1].summary.is_empty());
    }

    #[tokio::test]
    async fn test_all_chapters_failed_is_backend_unavailable() {
        let store = SessionStore::new();
        let backend = MockBackend::always_fails(BackendError::Unavailable {
            message: "timed out".to_string(),
        });
        let p = pipeline(backend, &store);

        let err = p.run(&two_chapter_doc(), "book.docx", "s1").await.unwrap_err();
        assert!(matches!(err, PipelineError::BackendUnavailable));

        // Failed results are still recorded in the session
        let session = store.get("s1").unwrap();
        assert_eq!(session.results.len(), 2);
        assert!(session
            .results
            .iter()
            .all(|r| r.status == SummaryStatus::Failed));
    }

    #[tokio::test]
    async fn test_wrong_extension_rejected() {
        let store = SessionStore::new();
        let p = pipeline(MockBackend::always_succeeds("x"), &store);

        let err = p.run(&two_chapter_doc(), "book.txt", "s1").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFileType(_)));
        assert!(store.get("s1").is_err());
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let store = SessionStore::new();
        let p = Pipeline::new(
            Summarizer::new(
                Box::new(MockBackend::always_succeeds("x")),
                SummarizeOptions {
                    max_chunk_size: 0,
                    ..test_options()
                },
            ),
            &store,
            SegmentOptions::default(),
        );

        let err = p.run(&two_chapter_doc(), "book.docx", "s1").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let store = SessionStore::new();
        let p = pipeline(MockBackend::always_succeeds("x"), &store);

        let err = p.run(&[], "book.docx", "s1").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFileType(_)));
    }

    #[tokio::test]
    async fn test_no_paragraphs_is_malformed() {
        let store = SessionStore::new();
        let p = pipeline(MockBackend::always_succeeds("x"), &store);

        let err = p.run(&make_docx(&[]), "book.docx", "s1").await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedDocument(_)));
        assert!(store.get("s1").is_err());
    }

    #[tokio::test]
    async fn test_empty_chapter_reported_without_backend_call() {
        let store = SessionStore::new();
        let doc = make_docx(&[
            (Some("Heading1"), "Empty Chapter"),
            (Some("Heading1"), "Full Chapter"),
            (None, "Actual text."),
        ]);
        let p = pipeline(MockBackend::always_succeeds("a summary"), &store);

        let results = p.run(&doc, "book.docx", "s1").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].summary, EMPTY_CHAPTER_SUMMARY);
        assert_eq!(results[0].status, SummaryStatus::Ok);
        assert_eq!(results[1].summary, "a summary");
    }

    #[tokio::test]
    async fn test_session_accumulates_across_runs() {
        let store = SessionStore::new();
        let p = pipeline(MockBackend::always_succeeds("a summary"), &store);

        p.run(&two_chapter_doc(), "one.docx", "shared").await.unwrap();
        p.run(&two_chapter_doc(), "two.docx", "shared").await.unwrap();

        let session = store.get("shared").unwrap();
        assert_eq!(session.results.len(), 4);
    }

    #[tokio::test]
    async fn test_results_ordered_by_chapter() {
        let store = SessionStore::new();
        let doc = make_docx(&[
            (Some("Heading1"), "A"),
            (None, "a text."),
            (Some("Heading1"), "B"),
            (None, "b text."),
            (Some("Heading1"), "C"),
            (None, "c text."),
        ]);
        let p = pipeline(MockBackend::always_succeeds("s"), &store);

        let results = p.run(&doc, "book.docx", "s1").await.unwrap();
        let orders: Vec<usize> = results.iter().map(|r| r.chapter_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }
}
