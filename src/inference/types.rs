//! Wire types for the inference client.
//!
//! These mirror the subset of the OpenAI Chat Completions API the gateway
//! uses: one request shape and the non-streaming response.

use serde::Serialize;

// ─── Request Types ───────────────────────────────────────────────────────────

/// A single message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// A user-role message carrying `text`.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Message role on the wire. Every prompt is sent as a single user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

// ─── Response Types ──────────────────────────────────────────────────────────

/// The text of a completed, non-streaming response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Assistant text; empty when the model produced nothing.
    pub text: String,
    /// Why generation stopped (`"stop"`, `"length"`, ...), if reported.
    pub finish_reason: Option<String>,
}
