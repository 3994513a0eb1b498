//! Turn Orchestrator: sequences one turn of the conversation.
//!
//! ```text
//! AwaitingInput → Classifying ─┬─→ GeneralReplied ──────────────────────┬─→ TurnComplete → AwaitingInput
//!                              └─→ Synthesizing → Executing → Summarizing ┘
//! ```
//!
//! There is no error state. Every step absorbs its own failures and hands a
//! fallback value down the normal path, so a turn always ends with an
//! Assistant message at the end of history.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use super::classifier::classify;
use super::executor;
use super::gateway::{Bounded, DataGateway, ModelGateway};
use super::summarizer::summarize;
use super::synthesizer::synthesize;
use super::types::{Conversation, ExecutionOutcome, Message, SqlCandidate};
use crate::config::AppConfig;

// ─── Public Types ────────────────────────────────────────────────────────────

/// Where the orchestrator is within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    Classifying,
    GeneralReplied,
    Synthesizing,
    Executing,
    Summarizing,
    TurnComplete,
}

/// Which branch a turn took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPath {
    General,
    Database,
}

/// What one turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    /// The last history entry after the turn.
    pub reply: String,
    pub path: TurnPath,
    /// Candidate that was handed to execution, if any.
    pub query: Option<SqlCandidate>,
    /// Execution outcome on the database path.
    pub outcome: Option<ExecutionOutcome>,
}

/// Per-session knobs.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// SQL dialect named in the synthesis prompt.
    pub dialect: String,
    /// Limit on each model call. `None` waits indefinitely.
    pub model_timeout: Option<Duration>,
    /// Limit on each query. `None` waits indefinitely.
    pub query_timeout: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            dialect: "SQLite".to_string(),
            model_timeout: Some(Duration::from_secs(60)),
            query_timeout: Some(Duration::from_secs(15)),
        }
    }
}

impl SessionSettings {
    /// Settings from the loaded config. A limit of `0` seconds disables it.
    pub fn from_config(config: &AppConfig) -> Self {
        let limit = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        Self {
            dialect: config.database.dialect.clone(),
            model_timeout: limit(config.session.model_timeout_secs),
            query_timeout: limit(config.session.query_timeout_secs),
        }
    }
}

/// Whether `text` is the end-of-session signal (`exit` or `quit`).
pub fn is_end_session(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit")
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Owns one session's Conversation and both gateways.
pub struct TurnOrchestrator {
    model: Box<dyn ModelGateway>,
    data: Box<dyn DataGateway>,
    conversation: Conversation,
    state: TurnState,
    dialect: String,
    turns: u64,
}

impl TurnOrchestrator {
    /// Build an orchestrator for a fresh session. Gateways are wrapped in
    /// [`Bounded`] when the settings carry a limit.
    pub fn new<M, D>(model: M, data: D, settings: SessionSettings) -> Self
    where
        M: ModelGateway + 'static,
        D: DataGateway + 'static,
    {
        let model: Box<dyn ModelGateway> = match settings.model_timeout {
            Some(limit) => Box::new(Bounded::new(model, limit)),
            None => Box::new(model),
        };
        let data: Box<dyn DataGateway> = match settings.query_timeout {
            Some(limit) => Box::new(Bounded::new(data, limit)),
            None => Box::new(data),
        };

        let conversation = Conversation::new();
        tracing::info!(
            session = conversation.id(),
            started_at = %conversation.started_at(),
            dialect = %settings.dialect,
            "orchestrator: session started"
        );

        Self {
            model,
            data,
            conversation,
            state: TurnState::AwaitingInput,
            dialect: settings.dialect,
            turns: 0,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Process one user message and return what the turn produced.
    pub async fn handle_message(&mut self, text: &str) -> TurnReport {
        self.turns += 1;
        let span = tracing::info_span!(
            "turn",
            session = %self.conversation.id(),
            turn = self.turns
        );
        self.run_turn(text).instrument(span).await
    }

    async fn run_turn(&mut self, text: &str) -> TurnReport {
        self.conversation.push(Message::human(text));
        self.transition(TurnState::Classifying);

        let classification = classify(&mut *self.model, &mut self.conversation).await;

        let (path, query, outcome) = if classification.is_general {
            self.transition(TurnState::GeneralReplied);
            self.conversation.set_last_query(None);
            self.conversation.set_last_result(None);
            (TurnPath::General, None, None)
        } else {
            self.transition(TurnState::Synthesizing);
            let candidate = synthesize(&mut *self.model, &self.conversation, &self.dialect).await;
            let candidate = (!candidate.is_empty()).then_some(candidate);
            self.conversation.set_last_query(candidate.clone());

            self.transition(TurnState::Executing);
            let outcome = executor::run(&*self.data, self.conversation.last_query()).await;
            self.conversation.set_last_result(Some(outcome.clone()));

            self.transition(TurnState::Summarizing);
            summarize(&mut *self.model, &mut self.conversation, &outcome).await;

            (TurnPath::Database, candidate, Some(outcome))
        };

        self.transition(TurnState::TurnComplete);
        tracing::debug!(
            history_len = self.conversation.len(),
            last_query = ?self.conversation.last_query().map(SqlCandidate::as_str),
            last_result = ?self.conversation.last_result().map(ExecutionOutcome::describe),
            "orchestrator: conversation snapshot"
        );

        let reply = self
            .conversation
            .last_message()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        self.transition(TurnState::AwaitingInput);
        tracing::info!(path = ?path, "orchestrator: turn complete");

        TurnReport {
            reply,
            path,
            query,
            outcome,
        }
    }

    fn transition(&mut self, next: TurnState) {
        tracing::debug!(from = ?self.state, to = ?next, "orchestrator: transition");
        self.state = next;
    }

    /// Drive turns from `reader` until `exit`/`quit` or end of input.
    ///
    /// Blank lines are skipped. Each reply is written as `Bot: <reply>`.
    pub async fn run_session<R, W>(&mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            writer.write_all(b"You: ").await?;
            writer.flush().await?;

            let Some(line) = lines.next_line().await? else {
                tracing::info!("orchestrator: input closed");
                writer.write_all(b"\n").await?;
                break;
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if is_end_session(text) {
                tracing::info!("orchestrator: end of session requested");
                break;
            }

            let report = self.handle_message(text).await;
            writer
                .write_all(format!("Bot: {}\n", report.reply).as_bytes())
                .await?;
        }

        writer.write_all(b"Goodbye!\n").await?;
        writer.flush().await?;
        tracing::info!(
            session = self.conversation.id(),
            turns = self.turns,
            "orchestrator: session ended"
        );
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
