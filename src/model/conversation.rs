//! Conversation state and history persistence
//!
//! `ConversationStore` is owned by the app and handed to components by
//! reference. It holds the current transcript, the in-flight prompt, the last
//! error, and the saved history of conversations.

use super::response::AgentResponse;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SUMMARY_MAX_CHARS: usize = 80;

/// One prompt and its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub prompt: String,
    pub response: AgentResponse,
    pub timestamp: DateTime<Local>,
}

impl Exchange {
    pub fn new(prompt: impl Into<String>, response: AgentResponse) -> Self {
        Self {
            prompt: prompt.into(),
            response,
            timestamp: Local::now(),
        }
    }

    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// A saved conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub exchanges: Vec<Exchange>,
}

impl Conversation {
    /// First prompt, shortened for list display
    pub fn title(&self) -> String {
        let Some(first) = self.exchanges.first() else {
            return String::new();
        };
        if first.prompt.chars().count() > SUMMARY_MAX_CHARS {
            let head: String = first.prompt.chars().take(SUMMARY_MAX_CHARS).collect();
            format!("{}...", head)
        } else {
            first.prompt.clone()
        }
    }

    pub fn formatted_date(&self) -> String {
        self.exchanges
            .first()
            .map(|e| e.timestamp.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn message_count_label(&self) -> String {
        let count = self.exchanges.len();
        format!("{} message{}", count, if count == 1 { "" } else { "s" })
    }

    /// Case-insensitive match against any prompt or response text
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.exchanges.iter().any(|e| {
            e.prompt.to_lowercase().contains(&needle)
                || e.response.text().to_lowercase().contains(&needle)
        })
    }
}

/// Why a prompt was not submitted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("Prompt is empty")]
    Blank,
    #[error("A request is already in progress")]
    InFlight,
}

/// Identifies one submitted request
pub type RequestId = u64;

/// The request currently awaiting an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    conversations: Vec<Conversation>,
}

#[derive(Debug)]
pub struct ConversationStore {
    transcript: Vec<Exchange>,
    history: Vec<Conversation>,
    /// History entry the transcript belongs to
    active: Option<usize>,
    pending: Option<PendingRequest>,
    next_request_id: RequestId,
    error: Option<String>,
    history_limit: usize,
    history_path: Option<PathBuf>,
}

impl ConversationStore {
    /// In-memory store
    pub fn new(history_limit: usize) -> Self {
        Self {
            transcript: Vec::new(),
            history: Vec::new(),
            active: None,
            pending: None,
            next_request_id: 1,
            error: None,
            history_limit: history_limit.max(1),
            history_path: None,
        }
    }

    /// Store backed by a history file
    ///
    /// A missing file starts empty. A file that cannot be read or parsed is
    /// moved aside to `<name>.bak` first; if that fails, history is kept in
    /// memory only so the file is never overwritten.
    pub fn with_persistence(path: PathBuf, history_limit: usize) -> Self {
        let mut store = Self::new(history_limit);
        match load_history(&path) {
            Ok(history) => {
                store.history = history;
                store.enforce_limit();
                tracing::debug!(
                    path = %path.display(),
                    conversations = store.history.len(),
                    "loaded conversation history"
                );
                store.history_path = Some(path);
            }
            Err(e) => {
                let backup = backup_path(&path);
                match fs::rename(&path, &backup) {
                    Ok(()) => {
                        tracing::warn!(error = ?e, backup = %backup.display(), "unreadable history moved aside");
                        store.history_path = Some(path);
                    }
                    Err(rename_error) => {
                        tracing::warn!(
                            error = ?e,
                            rename_error = %rename_error,
                            "unreadable history left in place, saving is off for this session"
                        );
                    }
                }
            }
        }
        store
    }

    /// Whether changes are written to disk
    pub fn is_persistent(&self) -> bool {
        self.history_path.is_some()
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    pub fn history(&self) -> &[Conversation] {
        &self.history
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.prompt.as_str())
    }

    pub fn pending_id(&self) -> Option<RequestId> {
        self.pending.as_ref().map(|p| p.id)
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Validate a prompt and mark it in flight under a fresh id
    pub fn submit(&mut self, prompt: &str) -> Result<PendingRequest, SubmitRejected> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SubmitRejected::Blank);
        }
        if self.pending.is_some() {
            return Err(SubmitRejected::InFlight);
        }
        let request = PendingRequest {
            id: self.next_request_id,
            prompt: prompt.to_string(),
        };
        self.next_request_id += 1;
        self.pending = Some(request.clone());
        self.error = None;
        Ok(request)
    }

    /// Record the outcome of request `id`
    ///
    /// Returns false, changing nothing, when `id` is not the request in flight
    /// (it was abandoned by `clear`).
    pub fn complete<E: Display>(&mut self, id: RequestId, result: Result<AgentResponse, E>) -> bool {
        if self.pending_id() != Some(id) {
            tracing::debug!(id, "ignoring answer for an abandoned request");
            return false;
        }
        let Some(PendingRequest { prompt, .. }) = self.pending.take() else {
            return false;
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "request failed");
                self.error = Some(e.to_string());
                return true;
            }
        };

        let exchange = Exchange::new(prompt, response);
        let starts_new = self.transcript.is_empty() || self.active.is_none();
        self.transcript.push(exchange.clone());

        match self.active {
            Some(index) if !starts_new && index < self.history.len() => {
                self.history[index].exchanges.push(exchange);
            }
            _ => {
                self.history.push(Conversation {
                    exchanges: vec![exchange],
                });
                self.active = Some(self.history.len() - 1);
            }
        }

        self.enforce_limit();
        self.persist();
        true
    }

    /// Reset the current transcript; history is kept
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.active = None;
        self.pending = None;
        self.error = None;
    }

    /// Load a history conversation as the current transcript
    pub fn select(&mut self, index: usize) -> bool {
        let Some(conversation) = self.history.get(index) else {
            return false;
        };
        self.transcript = conversation.exchanges.clone();
        self.active = Some(index);
        self.error = None;
        true
    }

    /// Remove a history conversation. Deleting the one on screen also
    /// clears the transcript, so later follow-ups start a new conversation.
    pub fn delete_entry(&mut self, index: usize) -> bool {
        if index >= self.history.len() {
            return false;
        }
        self.history.remove(index);
        self.active = match self.active {
            Some(a) if a == index => {
                self.transcript.clear();
                None
            }
            Some(a) if a > index => Some(a - 1),
            other => other,
        };
        self.persist();
        true
    }

    /// History indices matching `query`; all entries for a blank query
    pub fn search(&self, query: &str) -> Vec<usize> {
        let query = query.trim();
        self.history
            .iter()
            .enumerate()
            .filter(|(_, c)| query.is_empty() || c.matches(query))
            .map(|(i, _)| i)
            .collect()
    }

    fn enforce_limit(&mut self) {
        let excess = self.history.len().saturating_sub(self.history_limit);
        if excess == 0 {
            return;
        }
        self.history.drain(..excess);
        self.active = self.active.and_then(|a| a.checked_sub(excess));
    }

    fn persist(&self) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Err(e) = save_history(path, &self.history) {
            tracing::warn!(error = %e, "failed to save conversation history");
        }
    }
}

/// Saved conversations; an absent file is an empty history
fn load_history(path: &Path) -> Result<Vec<Conversation>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).context("Failed to read history file"),
    };
    let file: HistoryFile =
        serde_json::from_str(&contents).context("Failed to parse history file")?;
    Ok(file.conversations)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn save_history(path: &Path, conversations: &[Conversation]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create history directory")?;
    }
    let file = HistoryFile {
        conversations: conversations.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file).context("Failed to serialize history")?;
    fs::write(path, json).context("Failed to write history file")?;
    Ok(())
}
