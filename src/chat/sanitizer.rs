//! Text Sanitizer: turns free-form model text into the two shapes the core
//! consumes.
//!
//! - [`sanitize_sql`]: strips code-fence markers from generated SQL.
//! - [`parse_classification`]: extracts the classifier's `{"is_general": …}`
//!   payload, falling back to a bare `true`/`false` reading.
//!
//! Neither function understands SQL. `sanitize_sql` is a string transform and
//! nothing more; a statement that survives it can still be invalid or harmful,
//! and execution is the only place that is discovered.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::types::{ClassificationResult, SqlCandidate};

/// First fenced block, optionally tagged `json` (any case).
static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?i:json)?\s*(.*?)\s*```").expect("fence pattern is valid")
});

const FENCE: &str = "```";

// ─── SQL ────────────────────────────────────────────────────────────────────

/// Sanitize a synthesizer response into a candidate statement.
///
/// Empty or whitespace-only text becomes `SELECT 1`. Otherwise a leading
/// fence (optionally tagged `sql`) and a trailing fence are removed, both
/// anchored to the ends of the trimmed text, and the rest is trimmed.
pub fn sanitize_sql(response: &str) -> SqlCandidate {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return SqlCandidate::fallback();
    }

    let body = match trimmed.strip_prefix(FENCE) {
        Some(rest) => strip_sql_tag(rest),
        None => trimmed,
    };
    let body = body.strip_suffix(FENCE).unwrap_or(body);

    SqlCandidate::new(body.trim())
}

/// Drop a `sql` tag only when it is the whole tag (`sqlite` stays).
fn strip_sql_tag(text: &str) -> &str {
    match (text.get(..3), text.get(3..)) {
        (Some(tag), Some(rest))
            if tag.eq_ignore_ascii_case("sql")
                && rest.chars().next().map_or(true, char::is_whitespace) =>
        {
            rest
        }
        _ => text,
    }
}

// ─── Classification ─────────────────────────────────────────────────────────

/// What the classifier's model text turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationPayload {
    /// A JSON object: `{"is_general": bool, "response": "..."}`.
    Structured {
        is_general: bool,
        response: Option<String>,
    },
    /// Anything else, read as a boolean: only the text `true` counts as true.
    BooleanOnly(bool),
}

impl ClassificationPayload {
    pub fn is_general(&self) -> bool {
        match self {
            ClassificationPayload::Structured { is_general, .. } => *is_general,
            ClassificationPayload::BooleanOnly(flag) => *flag,
        }
    }

    pub fn into_result(self) -> ClassificationResult {
        match self {
            ClassificationPayload::Structured {
                is_general,
                response,
            } => ClassificationResult {
                is_general,
                response,
            },
            ClassificationPayload::BooleanOnly(is_general) => ClassificationResult {
                is_general,
                response: None,
            },
        }
    }
}

/// Parse classifier output.
///
/// Content of the first fenced block is preferred over the whole text. JSON
/// objects become [`ClassificationPayload::Structured`], with a missing or
/// non-boolean `is_general` read as `false`. Everything else becomes
/// [`ClassificationPayload::BooleanOnly`], true only for the text `true`
/// (any case).
pub fn parse_classification(text: &str) -> ClassificationPayload {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ClassificationPayload::BooleanOnly(false);
    }

    let cleaned = JSON_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => ClassificationPayload::Structured {
            is_general: map
                .get("is_general")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            response: map
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        Ok(Value::Bool(flag)) => ClassificationPayload::BooleanOnly(flag),
        _ => {
            let flag = cleaned.to_lowercase() == "true";
            if !flag && !cleaned.eq_ignore_ascii_case("false") {
                tracing::warn!(
                    text = %cleaned,
                    "classifier output is neither JSON nor a boolean; routing to database"
                );
            }
            ClassificationPayload::BooleanOnly(flag)
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
