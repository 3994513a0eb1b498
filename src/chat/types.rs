//! Shared types for the chat core.
//!
//! Messages, the per-session Conversation, and the turn-scoped values that
//! flow between classifier, synthesizer, execution step and summarizer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

// ─── Fallback Texts ─────────────────────────────────────────────────────────

/// Candidate used whenever synthesis yields nothing usable.
pub const FALLBACK_SQL: &str = "SELECT 1";

/// Notice when there is no candidate to execute.
pub const NO_SQL_GENERATED: &str = "No SQL query generated.";

/// Notice when the Data Gateway raised.
pub const QUERY_FAILED: &str = "Query execution failed.";

/// Notice when the Data Gateway returned no rows.
pub const NO_DATA_FOUND: &str = "No data found.";

/// Reply when the summarizer's model call returned no text.
pub const UNABLE_TO_ANALYZE: &str = "Unable to analyze data.";

/// Reply when producing an assistant message failed outright.
pub const ERROR_ANALYZING: &str = "Error analyzing data.";

// ─── Messages ───────────────────────────────────────────────────────────────

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    Human,
    Assistant,
}

impl MessageRole {
    /// Label used when rendering history into prompts.
    pub fn label(self) -> &'static str {
        match self {
            MessageRole::Human => "Human",
            MessageRole::Assistant => "Assistant",
        }
    }
}

/// One entry of the conversation history. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Human,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ─── Turn Values ────────────────────────────────────────────────────────────

/// One result row: column name → value.
pub type Row = Map<String, Value>;

/// SQL text produced by the synthesizer.
///
/// Only fence-stripped and trimmed, never parsed. Whether it is valid SQL is
/// discovered when the Data Gateway executes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCandidate(String);

impl SqlCandidate {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// The `SELECT 1` candidate.
    pub fn fallback() -> Self {
        Self(FALLBACK_SQL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SqlCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the execution step produced: rows, or a textual notice.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Rows(Vec<Row>),
    Notice(String),
}

impl ExecutionOutcome {
    pub fn notice(text: impl Into<String>) -> Self {
        ExecutionOutcome::Notice(text.into())
    }

    /// The notice text, if this outcome is a notice.
    pub fn as_notice(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Notice(text) => Some(text),
            ExecutionOutcome::Rows(_) => None,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            ExecutionOutcome::Rows(rows) => format!("{} row(s)", rows.len()),
            ExecutionOutcome::Notice(text) => format!("notice: {text}"),
        }
    }

    /// Render for inclusion in a prompt: rows as pretty JSON, notices verbatim.
    pub fn render(&self) -> String {
        match self {
            ExecutionOutcome::Rows(rows) => {
                serde_json::to_string_pretty(rows).unwrap_or_else(|_| format!("{rows:?}"))
            }
            ExecutionOutcome::Notice(text) => text.clone(),
        }
    }
}

/// Per-turn classification of the latest Human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub is_general: bool,
    /// Direct reply for general messages, when the model supplied one.
    pub response: Option<String>,
}

impl ClassificationResult {
    /// Route to query synthesis.
    pub fn database() -> Self {
        Self {
            is_general: false,
            response: None,
        }
    }
}

// ─── Conversation ───────────────────────────────────────────────────────────

/// History and scratch state for one session.
///
/// History is append-only. `last_query` and `last_result` describe the most
/// recent turn only and are overwritten every turn.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    started_at: DateTime<Utc>,
    messages: Vec<Message>,
    last_query: Option<SqlCandidate>,
    last_result: Option<ExecutionOutcome>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Empty history, empty scratch fields.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            messages: Vec::new(),
            last_query: None,
            last_result: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Index of the most recent Human message.
    fn latest_human_index(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| m.role == MessageRole::Human)
    }

    /// The most recent Human message.
    pub fn latest_human(&self) -> Option<&Message> {
        self.latest_human_index().map(|i| &self.messages[i])
    }

    /// Every message before the most recent Human message.
    pub fn prior_turns(&self) -> &[Message] {
        match self.latest_human_index() {
            Some(i) => &self.messages[..i],
            None => &self.messages,
        }
    }

    pub fn last_query(&self) -> Option<&SqlCandidate> {
        self.last_query.as_ref()
    }

    pub fn last_result(&self) -> Option<&ExecutionOutcome> {
        self.last_result.as_ref()
    }

    pub(crate) fn set_last_query(&mut self, query: Option<SqlCandidate>) {
        self.last_query = query;
    }

    pub(crate) fn set_last_result(&mut self, result: Option<ExecutionOutcome>) {
        self.last_result = result;
    }
}
