//! Ollama backend
//!
//! Talks to a local (or remote) Ollama server via its /api/generate endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{SummaryBackend, SummaryRequest, SummaryResponse};
use crate::error::{BackendError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Backend for an Ollama inference server
pub struct OllamaBackend {
    model: String,
    base_url: String,
    client: Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend. `base_url` defaults to localhost:11434.
    pub fn new(model: &str, base_url: Option<String>) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl SummaryBackend for OllamaBackend {
    async fn summarize(&self, request: SummaryRequest) -> Result<SummaryResponse> {
        let generate_request = GenerateRequest {
            model: self.model.clone(),
            prompt: request.text,
            system: request.system_prompt,
            stream: false,
            options: request
                .temperature
                .map(|temperature| GenerateOptions { temperature }),
        };

        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&generate_request)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable {
                message: format!("Request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // 503 means the server is up but cannot serve right now
            if status.as_u16() == 503 {
                return Err(BackendError::Unavailable { message: body });
            }

            return Err(BackendError::BadResponse {
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let generate_response: GenerateResponse =
            response.json().await.map_err(|e| BackendError::BadResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        if generate_response.response.trim().is_empty() {
            return Err(BackendError::BadResponse {
                message: "Empty response from Ollama".to_string(),
            });
        }

        Ok(SummaryResponse {
            content: generate_response.response,
            model: self.model.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "Ollama"
    }

    fn is_available(&self) -> Result<()> {
        // No API key required; reachability is only known at request time
        Ok(())
    }
}
