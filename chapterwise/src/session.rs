//! In-memory session store: per-caller accumulation of summary results.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Outcome of summarizing one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    Ok,
    Failed,
}

/// The summary record for a single chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Position of the chapter within its document
    pub chapter_order: usize,
    /// Chapter title
    pub title: String,
    /// The summary text (empty when failed)
    pub summary: String,
    /// Whether summarization succeeded
    pub status: SummaryStatus,
    /// Failure detail, or a truncation note on an otherwise-ok result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummaryResult {
    /// Create a successful result.
    pub fn ok(chapter_order: usize, title: String, summary: String) -> Self {
        Self {
            chapter_order,
            title,
            summary,
            status: SummaryStatus::Ok,
            error: None,
        }
    }

    /// Create a successful result carrying a note (e.g. truncated input).
    pub fn ok_with_note(chapter_order: usize, title: String, summary: String, note: String) -> Self {
        Self {
            chapter_order,
            title,
            summary,
            status: SummaryStatus::Ok,
            error: Some(note),
        }
    }

    /// Create a failed result.
    pub fn failed(chapter_order: usize, title: String, error: String) -> Self {
        Self {
            chapter_order,
            title,
            summary: String::new(),
            status: SummaryStatus::Failed,
            error: Some(error),
        }
    }
}

/// A caller-scoped accumulation of summary results across runs.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// Accumulated results, in append order
    pub results: Vec<SummaryResult>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            results: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Process-wide mapping from session id to accumulated results.
///
/// Each session sits behind its own lock, so appends for one id are
/// serialized while other ids stay independently accessible. The outer map
/// lock is held only long enough to find or insert an entry.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: &str) -> Arc<Mutex<Session>> {
        let mut map = self.inner.lock().expect("session map lock poisoned");
        map.entry(id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", id);
                Arc::new(Mutex::new(Session::new(id.to_string())))
            })
            .clone()
    }

    /// Get the session for `id`, creating it if absent. Returns a snapshot.
    pub fn get_or_create(&self, id: &str) -> Session {
        let entry = self.entry(id);
        let session = entry.lock().expect("session lock poisoned");
        session.clone()
    }

    /// Append a result to the session for `id`, creating it if absent.
    pub fn append(&self, id: &str, result: SummaryResult) {
        let entry = self.entry(id);
        let mut session = entry.lock().expect("session lock poisoned");
        session.results.push(result);
    }

    /// Replace the session for `id` with a fresh, empty one.
    pub fn reset(&self, id: &str) {
        let mut map = self.inner.lock().expect("session map lock poisoned");
        debug!("Resetting session {}", id);
        map.insert(
            id.to_string(),
            Arc::new(Mutex::new(Session::new(id.to_string()))),
        );
    }

    /// Look up an existing session. Returns a snapshot.
    pub fn get(&self, id: &str) -> Result<Session, SessionError> {
        let map = self.inner.lock().expect("session map lock poisoned");
        let entry = map
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?
            .clone();
        drop(map);

        let session = entry.lock().expect("session lock poisoned");
        Ok(session.clone())
    }
}

/// Generate a session id from the current time.
pub fn generate_id() -> String {
    Utc::now().format("session_%Y%m%d_%H%M%S%3f").to_string()
}
