//! Shared summarization backend client for the chapterwise workspace
//!
//! Provides a unified interface for multiple summarization backends:
//! - Ollama (local inference server)
//! - OpenAI-compatible APIs (OpenAI, OpenRouter, and others)
//! - Mock backend for testing

pub mod backend;
pub mod config;
pub mod error;
pub mod providers;

pub use backend::{SummaryBackend, SummaryRequest, SummaryResponse};
pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{BackendError, Result};
pub use providers::{MockBackend, ProviderKind, get_backend};
