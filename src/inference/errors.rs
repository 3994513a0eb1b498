//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility; these types carry the context needed to build
//! meaningful log entries.

use thiserror::Error;

/// Errors that can occur during inference operations.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// TCP/HTTP connection to the model endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed {
        endpoint: String,
        reason: String,
    },

    /// The model endpoint did not respond within the configured timeout.
    #[error("inference timeout after {duration_secs}s")]
    Timeout {
        duration_secs: u64,
    },

    /// Non-2xx HTTP response from the model endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError {
        status: u16,
        body: String,
    },

    /// The response body was not a chat completion we could read.
    #[error("response error: {reason}")]
    ResponseError {
        reason: String,
    },

    /// Every model in the fallback chain was unavailable.
    #[error("all models unavailable (tried: {})", attempted.join(", "))]
    AllModelsUnavailable {
        attempted: Vec<String>,
    },

    /// Model registry resolution or validation error.
    #[error("config error: {reason}")]
    ConfigError {
        reason: String,
    },

    /// A hosted model has no API key after env interpolation.
    #[error("model '{model}' requires an API key but none is configured")]
    MissingCredential {
        model: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_models_unavailable_lists_attempts() {
        let err = InferenceError::AllModelsUnavailable {
            attempted: vec!["gemini-flash".into(), "local-llama".into()],
        };
        assert_eq!(
            err.to_string(),
            "all models unavailable (tried: gemini-flash, local-llama)"
        );
    }
}
