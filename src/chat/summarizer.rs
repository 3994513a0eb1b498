//! Result Summarizer: turns an execution outcome into the assistant reply
//! and appends it to history.

use super::gateway::ModelGateway;
use super::prompts::summary_prompt;
use super::types::{Conversation, ExecutionOutcome, Message, ERROR_ANALYZING, UNABLE_TO_ANALYZE};

/// Produce the reply for a database turn and append it as an Assistant message.
///
/// A model failure appends "Error analyzing data."; an empty completion
/// appends "Unable to analyze data.". Returns the appended text.
pub async fn summarize(
    model: &mut dyn ModelGateway,
    conversation: &mut Conversation,
    outcome: &ExecutionOutcome,
) -> String {
    let prompt = summary_prompt(conversation.messages(), outcome);

    let reply = match model.complete(&prompt).await {
        Ok(text) if text.trim().is_empty() => {
            tracing::warn!("summarizer: model returned no text");
            UNABLE_TO_ANALYZE.to_string()
        }
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "summarizer: model call failed");
            ERROR_ANALYZING.to_string()
        }
    };

    conversation.push(Message::assistant(reply.clone()));
    reply
}
