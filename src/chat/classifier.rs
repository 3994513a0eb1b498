//! Intent Classifier: decides per turn whether the latest Human message is
//! general conversation or needs the database.

use super::gateway::ModelGateway;
use super::prompts::classifier_prompt;
use super::sanitizer::parse_classification;
use super::types::{ClassificationResult, Conversation, Message, ERROR_ANALYZING};

/// Classify the latest Human message of `conversation`.
///
/// Never fails: an unreachable model, an empty reply or unreadable output all
/// yield a database classification. When the message is general the reply
/// is appended to history here, and the caller does nothing further this
/// turn. A general classification without reply text appends
/// "Error analyzing data." instead.
pub async fn classify(
    model: &mut dyn ModelGateway,
    conversation: &mut Conversation,
) -> ClassificationResult {
    let Some(latest) = conversation.latest_human() else {
        tracing::debug!("classifier: no human message in history");
        return ClassificationResult::database();
    };

    let prompt = classifier_prompt(conversation.prior_turns(), &latest.content);

    let result = match model.complete(&prompt).await {
        Ok(text) => parse_classification(&text).into_result(),
        Err(e) => {
            tracing::warn!(error = %e, "classifier: model call failed, routing to database");
            return ClassificationResult::database();
        }
    };

    if result.is_general {
        let reply = match result.response.as_deref() {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => {
                tracing::warn!("classifier: general intent without a reply");
                ERROR_ANALYZING.to_string()
            }
        };
        conversation.push(Message::assistant(reply));
    }

    tracing::info!(is_general = result.is_general, "classifier: message classified");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::gateway::testing::ScriptedModel;
    use crate::chat::types::MessageRole;

    fn asked(text: &str) -> Conversation {
        let mut conv = Conversation::new();
        conv.push(Message::human(text));
        conv
    }

    #[tokio::test]
    async fn general_reply_is_appended() {
        let mut model = ScriptedModel::new().then_reply(
            "```json\n{\"is_general\": true, \"response\": \"Hello! How can I help you shop today?\"}\n```",
        );
        let mut conv = asked("Hi, how are you?");

        let result = classify(&mut model, &mut conv).await;

        assert!(result.is_general);
        assert_eq!(
            conv.last_message(),
            Some(&Message::assistant("Hello! How can I help you shop today?"))
        );
    }

    #[tokio::test]
    async fn database_inquiry_leaves_history_alone() {
        let mut model = ScriptedModel::new().then_reply(r#"{"is_general": false}"#);
        let mut conv = asked("List all suppliers offering electronics.");

        let result = classify(&mut model, &mut conv).await;

        assert_eq!(result, ClassificationResult::database());
        assert_eq!(conv.len(), 1);
    }

    #[tokio::test]
    async fn bare_true_appends_error_fallback() {
        let mut model = ScriptedModel::new().then_reply("TRUE");
        let mut conv = asked("Thanks a lot!");

        let result = classify(&mut model, &mut conv).await;

        assert!(result.is_general);
        assert!(result.response.is_none());
        assert_eq!(conv.last_message(), Some(&Message::assistant("Error analyzing data.")));
    }

    #[tokio::test]
    async fn gateway_failure_routes_to_database() {
        let mut model = ScriptedModel::new().then_fail();
        let mut conv = asked("Hello");

        let result = classify(&mut model, &mut conv).await;

        assert!(!result.is_general);
        assert_eq!(conv.len(), 1);
    }

    #[tokio::test]
    async fn empty_reply_routes_to_database() {
        let mut model = ScriptedModel::new().then_reply("   ");
        let mut conv = asked("Hello");
        assert!(!classify(&mut model, &mut conv).await.is_general);
    }

    #[tokio::test]
    async fn empty_history_skips_model() {
        let mut model = ScriptedModel::new();
        let prompts = model.prompts();
        let mut conv = Conversation::new();

        let result = classify(&mut model, &mut conv).await;

        assert!(!result.is_general);
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_prior_turns_and_latest_message() {
        let mut model = ScriptedModel::new().then_reply(r#"{"is_general": false}"#);
        let prompts = model.prompts();
        let mut conv = Conversation::new();
        conv.push(Message::human("Do you sell laptops?"));
        conv.push(Message::assistant("Yes, we have three models."));
        conv.push(Message::human("Which is cheapest?"));

        classify(&mut model, &mut conv).await;

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Human: Do you sell laptops?\nAssistant: Yes, we have three models."));
        assert!(!prompts[0].contains("Human: Which is cheapest?"));
        assert!(prompts[0].ends_with("Which is cheapest?"));
    }

    #[tokio::test]
    async fn classification_is_deterministic_for_unchanged_history() {
        let reply = r#"{"is_general": true, "response": "We are open 24/7."}"#;
        let conv = asked("When are you open?");

        let mut first_conv = conv.clone();
        let mut second_conv = conv.clone();
        let first = classify(&mut ScriptedModel::new().then_reply(reply), &mut first_conv).await;
        let second = classify(&mut ScriptedModel::new().then_reply(reply), &mut second_conv).await;

        assert_eq!(first, second);
        assert_eq!(first_conv.messages(), second_conv.messages());
        assert_eq!(first_conv.last_message().map(|m| m.role), Some(MessageRole::Assistant));
    }
}
