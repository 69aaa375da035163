//! chapterwise configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::segment::{LeadingTextPolicy, SegmentOptions};
use crate::summarize::SummarizeOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterwiseConfig {
    /// Upper bound on text size per backend call, in bytes
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Additional attempts after a failed backend call
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed backoff between attempts, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Reduction passes before oversized input is truncated
    #[serde(default = "default_max_reduction_depth")]
    pub max_reduction_depth: u32,

    /// Per-call timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Chapter title for documents without headings
    #[serde(default = "default_chapter_title")]
    pub default_chapter_title: String,

    /// Policy for body text before the first heading
    #[serde(default = "default_leading_text")]
    pub leading_text: LeadingTextPolicy,

    /// Backend preset name (client default if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

fn default_max_chunk_size() -> usize {
    4000
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_reduction_depth() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_chapter_title() -> String {
    "Document".to_string()
}

fn default_leading_text() -> LeadingTextPolicy {
    LeadingTextPolicy::Introduction
}

impl Default for ChapterwiseConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_reduction_depth: default_max_reduction_depth(),
            request_timeout_secs: default_request_timeout_secs(),
            default_chapter_title: default_chapter_title(),
            leading_text: default_leading_text(),
            preset: None,
        }
    }
}

impl ChapterwiseConfig {
    /// Get the config file path: ~/.config/chapterwise/chapterwise.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("chapterwise")
            .join("chapterwise.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: ChapterwiseConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Check value ranges before running the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            anyhow::bail!("max_chunk_size must be a positive integer");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be a positive integer");
        }
        if self.default_chapter_title.trim().is_empty() {
            anyhow::bail!("default_chapter_title must not be empty");
        }
        Ok(())
    }

    pub fn summarize_options(&self) -> SummarizeOptions {
        SummarizeOptions {
            max_chunk_size: self.max_chunk_size,
            retry_attempts: self.retry_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            max_reduction_depth: self.max_reduction_depth,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            default_title: self.default_chapter_title.clone(),
            leading_text: self.leading_text,
        }
    }
}
