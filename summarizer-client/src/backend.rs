use async_trait::async_trait;

use crate::error::Result;

/// Request sent to a summarization backend
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// The text to summarize
    pub text: String,
    /// Optional system prompt framing the task
    pub system_prompt: Option<String>,
    /// Sampling temperature (backend default if None)
    pub temperature: Option<f32>,
}

impl SummaryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            system_prompt: None,
            temperature: None,
        }
    }
}

/// Response from a summarization backend
#[derive(Debug, Clone)]
pub struct SummaryResponse {
    pub content: String,
    pub model: String,
}

/// Trait for summarization backends
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Summarize the request text, returning the backend's summary.
    ///
    /// Fails with `BackendError::Unavailable` when the backend cannot be
    /// reached and `BackendError::BadResponse` when it answers with something
    /// unusable (error status, empty content, unparseable body).
    async fn summarize(&self, request: SummaryRequest) -> Result<SummaryResponse>;

    /// Get the backend name for display
    fn name(&self) -> &'static str;

    /// Check if the backend is available (API key set, etc.)
    fn is_available(&self) -> Result<()>;
}
