//! OpenAI-compatible API backend
//!
//! Used for providers that implement the OpenAI chat completions API:
//! - OpenAI
//! - OpenRouter
//! - And others

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{SummaryBackend, SummaryRequest, SummaryResponse};
use crate::error::{BackendError, Result};

/// Backend for OpenAI-compatible APIs
pub struct OpenAICompatibleBackend {
    model: String,
    base_url: String,
    api_key: String,
    name: &'static str,
    client: Client,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(model: &str, base_url: &str, api_key: String, name: &'static str) -> Result<Self> {
        let client = Client::new();

        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            name,
            client,
        })
    }

    /// Create an OpenAI backend
    pub fn openai(model: &str, api_key: String) -> Result<Self> {
        Self::new(model, "https://api.openai.com/v1", api_key, "OpenAI")
    }

    /// Create an OpenRouter backend
    pub fn openrouter(model: &str, api_key: String) -> Result<Self> {
        Self::new(model, "https://openrouter.ai/api/v1", api_key, "OpenRouter")
    }
}

// OpenAI API request/response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl SummaryBackend for OpenAICompatibleBackend {
    async fn summarize(&self, request: SummaryRequest) -> Result<SummaryResponse> {
        let mut messages = Vec::new();

        if let Some(system) = &request.system_prompt {
            messages.push(Message {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(Message {
            role: "user".to_string(),
            content: request.text.clone(),
        });

        let chat_request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            // 503 means the server is overloaded, not that our input was bad
            if status.as_u16() == 503 {
                return Err(BackendError::Unavailable { message });
            }

            return Err(BackendError::BadResponse {
                message: format!("HTTP {}: {}", status.as_u16(), message),
            });
        }

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(|e| BackendError::BadResponse {
                message: format!("Failed to parse response: {}", e),
            })?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(BackendError::BadResponse {
                message: "Empty completion content".to_string(),
            });
        }

        Ok(SummaryResponse {
            content,
            model: self.model.clone(),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}
