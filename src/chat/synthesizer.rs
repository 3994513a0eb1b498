//! Query Synthesizer: asks the model for one SELECT statement answering the
//! latest Human message and sanitizes the reply into a [`SqlCandidate`].

use super::gateway::ModelGateway;
use super::prompts::synthesis_prompt;
use super::sanitizer::sanitize_sql;
use super::types::{Conversation, SqlCandidate};

/// Synthesize a candidate statement for the latest Human message.
///
/// Any failure, and an empty reply, yields `SELECT 1`.
pub async fn synthesize(
    model: &mut dyn ModelGateway,
    conversation: &Conversation,
    dialect: &str,
) -> SqlCandidate {
    let Some(latest) = conversation.latest_human() else {
        tracing::warn!("synthesizer: no human message in history");
        return SqlCandidate::fallback();
    };

    let prompt = synthesis_prompt(conversation.messages(), &latest.content, dialect);

    match model.complete(&prompt).await {
        Ok(text) => {
            let candidate = sanitize_sql(&text);
            tracing::info!(sql = %candidate, "synthesizer: candidate ready");
            candidate
        }
        Err(e) => {
            tracing::warn!(error = %e, "synthesizer: model call failed, using fallback query");
            SqlCandidate::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::gateway::testing::ScriptedModel;
    use crate::chat::types::Message;

    fn asked(text: &str) -> Conversation {
        let mut conv = Conversation::new();
        conv.push(Message::human(text));
        conv
    }

    #[tokio::test]
    async fn fenced_reply_is_sanitized() {
        let mut model = ScriptedModel::new()
            .then_reply("```sql\nSELECT * FROM Categories WHERE name LIKE '%electronic%';\n```");
        let conv = asked("List all suppliers offering electronics.");

        let sql = synthesize(&mut model, &conv, "SQLite").await;

        assert_eq!(
            sql.as_str(),
            "SELECT * FROM Categories WHERE name LIKE '%electronic%';"
        );
    }

    #[tokio::test]
    async fn blank_reply_falls_back() {
        for blank in ["", "  \n "] {
            let mut model = ScriptedModel::new().then_reply(blank);
            let sql = synthesize(&mut model, &asked("anything"), "SQLite").await;
            assert_eq!(sql.as_str(), "SELECT 1");
        }
    }

    #[tokio::test]
    async fn gateway_failure_falls_back() {
        let mut model = ScriptedModel::new().then_fail();
        let sql = synthesize(&mut model, &asked("anything"), "SQLite").await;
        assert_eq!(sql, SqlCandidate::fallback());
    }

    #[tokio::test]
    async fn no_human_message_skips_model() {
        let mut model = ScriptedModel::new().then_reply("SELECT name FROM Products");
        let prompts = model.prompts();
        let mut conv = Conversation::new();
        conv.push(Message::assistant("Welcome to the store!"));

        for conv in [Conversation::new(), conv] {
            let sql = synthesize(&mut model, &conv, "SQLite").await;
            assert_eq!(sql.as_str(), "SELECT 1");
        }
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompt_embeds_history_and_target() {
        let mut model = ScriptedModel::new().then_reply("SELECT name FROM Products");
        let prompts = model.prompts();
        let mut conv = Conversation::new();
        conv.push(Message::human("Hi"));
        conv.push(Message::assistant("Hello!"));
        conv.push(Message::human("Show garden products"));

        synthesize(&mut model, &conv, "SQLite").await;

        let prompts = prompts.lock().unwrap();
        assert!(prompts[0].contains("Human: Hi\nAssistant: Hello!\nHuman: Show garden products"));
        assert_eq!(prompts[0].matches("Show garden products").count(), 2);
    }
}
