//! Mock summarization backend for testing
//!
//! Provides a configurable mock backend that can simulate failures, retries,
//! per-input failures, and successful responses.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{SummaryBackend, SummaryRequest, SummaryResponse};
use crate::error::{BackendError, Result};

/// A mock backend for testing retry and failure-isolation behavior
pub struct MockBackend {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<BackendError>>,
    /// If set, only requests whose text contains this substring fail
    fail_needle: Option<String>,
    /// Response content to return on success
    success_response: String,
    /// Artificial latency before answering (for timeout tests)
    delay: Option<std::time::Duration>,
    /// Backend name for display
    name: &'static str,
}

impl MockBackend {
    /// Create a backend that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: BackendError, response: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            fail_needle: None,
            success_response: response.to_string(),
            delay: None,
            name: "mock",
        }
    }

    /// Create a backend that always fails with the given error
    pub fn always_fails(error: BackendError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            fail_needle: None,
            success_response: String::new(),
            delay: None,
            name: "mock",
        }
    }

    /// Create a backend that always succeeds
    pub fn always_succeeds(response: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            fail_needle: None,
            success_response: response.to_string(),
            delay: None,
            name: "mock",
        }
    }

    /// Create a backend that fails only for requests containing `needle`
    pub fn fails_when_contains(needle: &str, error: BackendError, response: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            fail_needle: Some(needle.to_string()),
            success_response: response.to_string(),
            delay: None,
            name: "mock",
        }
    }

    /// Get the number of times summarize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Set a custom backend name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Add artificial latency before each response
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl SummaryBackend for MockBackend {
    async fn summarize(&self, request: SummaryRequest) -> Result<SummaryResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        let fail_count = self.fail_count.load(Ordering::SeqCst);

        let matches_needle = self
            .fail_needle
            .as_ref()
            .map(|needle| request.text.contains(needle))
            .unwrap_or(true);

        if call_num < fail_count && matches_needle {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(SummaryResponse {
            content: self.success_response.clone(),
            model: "mock-model".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a BackendError (needed because BackendError doesn't implement Clone)
fn clone_error(err: &BackendError) -> BackendError {
    match err {
        BackendError::Unavailable { message } => BackendError::Unavailable {
            message: message.clone(),
        },
        BackendError::BadResponse { message } => BackendError::BadResponse {
            message: message.clone(),
        },
        BackendError::MissingApiKey { provider, env_var } => BackendError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        BackendError::ConfigError(s) => BackendError::ConfigError(s.clone()),
        BackendError::InvalidPreset(s) => BackendError::InvalidPreset(s.clone()),
        // Io and Toml errors can't be cloned; fold them into a generic error
        BackendError::Io(_) => BackendError::ConfigError("IO error (mock)".to_string()),
        BackendError::TomlParse(_) => BackendError::ConfigError("TOML parse error (mock)".to_string()),
        BackendError::TomlSerialize(_) => {
            BackendError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let backend = MockBackend::always_succeeds("a summary");
        let request = SummaryRequest::new("test");

        let result = backend.summarize(request).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().content, "a summary");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let backend = MockBackend::always_fails(BackendError::Unavailable {
            message: "connection refused".to_string(),
        });
        let request = SummaryRequest::new("test");

        for _ in 0..3 {
            let result = backend.summarize(request.clone()).await;
            assert!(result.is_err());
        }
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let backend = MockBackend::fails_then_succeeds(
            2,
            BackendError::Unavailable {
                message: "connection refused".to_string(),
            },
            "a summary",
        );
        let request = SummaryRequest::new("test");

        // First two calls fail
        assert!(backend.summarize(request.clone()).await.is_err());
        assert!(backend.summarize(request.clone()).await.is_err());

        // Third call succeeds
        let result = backend.summarize(request).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().content, "a summary");
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_when_contains() {
        let backend = MockBackend::fails_when_contains(
            "poison",
            BackendError::BadResponse {
                message: "empty".to_string(),
            },
            "a summary",
        );

        let ok = backend.summarize(SummaryRequest::new("clean text")).await;
        assert!(ok.is_ok());

        let err = backend
            .summarize(SummaryRequest::new("text with poison inside"))
            .await;
        assert!(err.is_err());
    }
}
