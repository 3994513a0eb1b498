//! Non-streaming chat completion response parser.

use serde::Deserialize;

use super::errors::InferenceError;
use super::types::Completion;

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Parse a `POST /chat/completions` body into a [`Completion`].
///
/// Absent or `null` content yields an empty `text`; deciding what an empty
/// answer means is the caller's job.
pub fn parse_completion_response(body: &str) -> Result<Completion, InferenceError> {
    let resp: CompletionResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::ResponseError {
            reason: format!("failed to parse completion response: {e}"),
        })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or(InferenceError::ResponseError {
            reason: "empty choices array".into(),
        })?;

    Ok(Completion {
        text: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    })
}
