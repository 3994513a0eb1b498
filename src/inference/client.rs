//! OpenAI-compatible inference client.
//!
//! Sends single-prompt chat completion requests to the configured model and
//! returns the assistant text. Handles the fallback chain when the primary
//! model is unavailable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::config::{ModelConfig, ModelsConfig};
use super::errors::InferenceError;
use super::response::parse_completion_response;
use super::types::{ChatCompletionRequest, ChatMessage, Completion};
use crate::chat::gateway::ModelGateway;

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default total request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// Client for the model completion endpoint.
///
/// Created from `ModelsConfig` and holds the current model configuration.
/// Once a model fails with a retriable error the client stays on the next
/// model in the chain for the rest of the session.
pub struct InferenceClient {
    http: HttpClient,
    /// The full models configuration (for fallback chain).
    config: ModelsConfig,
    /// The current model key (e.g., "gemini-flash").
    current_model_key: String,
    /// The current model configuration.
    current_model: ModelConfig,
    /// Models that have already been tried and failed.
    exhausted_models: Vec<String>,
    request_timeout: Duration,
}

impl InferenceClient {
    /// Create a new inference client from the models configuration.
    ///
    /// Resolves the active model from config. Does NOT check connectivity;
    /// that happens on the first request or via [`health_check`](Self::health_check).
    pub fn from_config(
        config: ModelsConfig,
        request_timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let (key, model) = super::config::resolve_active_model(&config)?;

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| InferenceError::ConnectionFailed {
                endpoint: model.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            config,
            current_model_key: key,
            current_model: model,
            exhausted_models: Vec::new(),
            request_timeout,
        })
    }

    /// The base URL of the current model's endpoint.
    pub fn current_base_url(&self) -> &str {
        &self.current_model.base_url
    }

    /// The display name of the currently selected model.
    pub fn current_model_name(&self) -> &str {
        &self.current_model.display_name
    }

    // ─── Completion ──────────────────────────────────────────────────────

    /// Send `prompt` as a single user message and return the completion.
    ///
    /// If the current model is unavailable, walks the fallback chain before
    /// returning an error.
    pub async fn complete_prompt(&mut self, prompt: &str) -> Result<Completion, InferenceError> {
        let messages = vec![ChatMessage::user(prompt)];
        let mut last_error: Option<InferenceError> = None;

        for _attempt in 0..=self.remaining_fallbacks() {
            match self.try_request(&messages).await {
                Ok(completion) => return Ok(completion),
                Err(e) if Self::is_retriable(&e) => {
                    tracing::warn!(
                        model = %self.current_model_key,
                        error = %e,
                        "model request failed, trying next fallback"
                    );
                    last_error = Some(e);
                    if self.try_next_fallback().is_err() {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(InferenceError::AllModelsUnavailable {
            attempted: self.exhausted_models.clone(),
        }))
    }

    /// Attempt a single request to the current model.
    async fn try_request(&self, messages: &[ChatMessage]) -> Result<Completion, InferenceError> {
        let url = format!("{}/chat/completions", self.current_model.base_url);
        let model_name = self
            .current_model
            .model_name
            .clone()
            .unwrap_or_else(|| self.current_model_key.clone());

        let body = ChatCompletionRequest {
            model: model_name,
            messages: messages.to_vec(),
            temperature: self.current_model.temperature,
            max_tokens: self.current_model.max_tokens,
            stream: false,
        };

        // Log the request metadata, not the prompt: it embeds the whole schema
        tracing::info!(
            url = %url,
            model = %body.model,
            prompt_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            max_tokens = body.max_tokens,
            "=== LLM REQUEST ==="
        );

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = self.current_model.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout {
                    duration_secs: self.request_timeout.as_secs(),
                }
            } else {
                InferenceError::ConnectionFailed {
                    endpoint: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response.text().await.map_err(|e| InferenceError::ResponseError {
            reason: format!("failed to read response body: {e}"),
        })?;

        let completion = parse_completion_response(&body_text)?;
        tracing::info!(
            model = %self.current_model_key,
            response_chars = completion.text.len(),
            finish_reason = completion.finish_reason.as_deref().unwrap_or("unknown"),
            "=== LLM RESPONSE ==="
        );
        Ok(completion)
    }

    // ─── Health Check ────────────────────────────────────────────────────

    /// Check if the current model endpoint is reachable.
    ///
    /// Lists models rather than completing, so no tokens are consumed.
    pub async fn health_check(&self) -> Result<bool, InferenceError> {
        let url = format!("{}/models", self.current_model.base_url);

        let mut request = self.http.get(&url).timeout(CONNECT_TIMEOUT);
        if let Some(key) = self.current_model.api_key() {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    // ─── Fallback Chain ──────────────────────────────────────────────────

    /// Move to the next model in the fallback chain.
    ///
    /// Returns `Err` if no more fallbacks are available.
    pub fn try_next_fallback(&mut self) -> Result<(), InferenceError> {
        self.exhausted_models.push(self.current_model_key.clone());

        for key in &self.config.fallback_chain {
            if self.exhausted_models.contains(key) {
                continue;
            }
            if let Some(model) = self.config.models.get(key) {
                tracing::info!(from = %self.current_model_key, to = %key, "switching model");
                self.current_model_key = key.clone();
                self.current_model = model.clone();
                return Ok(());
            }
        }

        Err(InferenceError::AllModelsUnavailable {
            attempted: self.exhausted_models.clone(),
        })
    }

    /// Worst-case duration of one [`complete_prompt`](Self::complete_prompt):
    /// the current model and every untried fallback each using the full
    /// request timeout.
    pub fn chain_budget(&self) -> Duration {
        let fallbacks = self
            .config
            .fallback_chain
            .iter()
            .filter(|k| **k != self.current_model_key)
            .filter(|k| !self.exhausted_models.contains(k) && self.config.models.contains_key(*k))
            .count();
        self.request_timeout * (1 + fallbacks as u32)
    }

    /// Number of remaining fallback models.
    fn remaining_fallbacks(&self) -> usize {
        self.config
            .fallback_chain
            .iter()
            .filter(|k| !self.exhausted_models.contains(k))
            .count()
    }

    /// Whether an error should trigger a fallback attempt.
    ///
    /// HTTP 404 is included because Ollama returns 404 when a model isn't
    /// pulled. HTTP 429 is a hosted provider's quota rejection; another
    /// model in the chain may still answer.
    fn is_retriable(err: &InferenceError) -> bool {
        matches!(
            err,
            InferenceError::ConnectionFailed { .. }
                | InferenceError::Timeout { .. }
                | InferenceError::HttpError { status: 404, .. }
                | InferenceError::HttpError { status: 429, .. }
                | InferenceError::HttpError { status: 500, .. }
                | InferenceError::HttpError { status: 502..=504, .. }
        )
    }
}

#[async_trait]
impl ModelGateway for InferenceClient {
    async fn complete(&mut self, prompt: &str) -> Result<String, InferenceError> {
        self.complete_prompt(prompt).await.map(|c| c.text)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use crate::chat::gateway::Bounded;
    use tokio::net::TcpListener;

    fn model(name: &str, base_url: &str) -> ModelConfig {
        ModelConfig {
            display_name: name.to_string(),
            runtime: "ollama".to_string(),
            model_name: Some(format!("{}:latest", name.to_lowercase())),
            base_url: base_url.to_string(),
            api_key: None,
            temperature: 0.2,
            max_tokens: 512,
        }
    }

    fn test_config(url_a: &str, url_b: &str) -> ModelsConfig {
        let mut models = HashMap::new();
        models.insert("model-a".to_string(), model("Model A", url_a));
        models.insert("model-b".to_string(), model("Model B", url_b));

        ModelsConfig {
            active_model: "model-a".to_string(),
            models,
            fallback_chain: vec!["model-a".to_string(), "model-b".to_string()],
        }
    }

    /// Serve exactly one HTTP request with a canned status and body.
    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // Read headers, then as much body as Content-Length announces
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    #[test]
    fn test_from_config_selects_active_model() {
        let client = InferenceClient::from_config(
            test_config("http://localhost:11111/v1", "http://localhost:22222/v1"),
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();
        assert_eq!(client.current_model_key, "model-a");
        assert_eq!(client.current_model_name(), "Model A");
        assert_eq!(client.current_base_url(), "http://localhost:11111/v1");
    }

    #[test]
    fn test_fallback_chain() {
        let mut client = InferenceClient::from_config(
            test_config("http://localhost:11111/v1", "http://localhost:22222/v1"),
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();

        client.try_next_fallback().unwrap();
        assert_eq!(client.current_model_key, "model-b");

        let result = client.try_next_fallback();
        assert!(result.is_err());
    }

    #[test]
    fn test_remaining_fallbacks() {
        let client = InferenceClient::from_config(
            test_config("http://localhost:11111/v1", "http://localhost:22222/v1"),
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();
        assert_eq!(client.remaining_fallbacks(), 2);
    }

    #[test]
    fn test_is_retriable() {
        assert!(InferenceClient::is_retriable(&InferenceError::ConnectionFailed {
            endpoint: "".into(),
            reason: "".into()
        }));
        assert!(InferenceClient::is_retriable(&InferenceError::Timeout {
            duration_secs: 5
        }));
        assert!(InferenceClient::is_retriable(&InferenceError::HttpError {
            status: 429,
            body: "quota".into()
        }));
        assert!(InferenceClient::is_retriable(&InferenceError::HttpError {
            status: 503,
            body: "".into()
        }));
        assert!(!InferenceClient::is_retriable(&InferenceError::HttpError {
            status: 401,
            body: "bad key".into()
        }));
        assert!(!InferenceClient::is_retriable(&InferenceError::ResponseError {
            reason: "".into()
        }));
    }

    #[tokio::test]
    async fn test_complete_returns_assistant_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hello there"},"finish_reason":"stop"}]}"#;
        let base = serve_once("200 OK", body.to_string()).await;

        let mut client =
            InferenceClient::from_config(test_config(&base, &base), DEFAULT_REQUEST_TIMEOUT)
                .unwrap();
        let text = client.complete("Say hello").await.unwrap();
        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn test_non_retriable_status_is_returned() {
        let base = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#.to_string()).await;

        let mut client = InferenceClient::from_config(
            test_config(&base, "http://127.0.0.1:1"),
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();
        let err = client.complete("hi").await.unwrap_err();
        assert!(matches!(err, InferenceError::HttpError { status: 401, .. }));
        assert_eq!(client.current_model_key, "model-a");
    }

    /// Accept connections and never answer them.
    async fn serve_hung() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        format!("http://{addr}")
    }

    #[test]
    fn test_chain_budget_shrinks_as_models_are_exhausted() {
        let mut client = InferenceClient::from_config(
            test_config("http://localhost:11111/v1", "http://localhost:22222/v1"),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(client.chain_budget(), Duration::from_secs(20));

        client.try_next_fallback().unwrap();
        assert_eq!(client.chain_budget(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_hung_primary_falls_back_within_chain_budget() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"from fallback"},"finish_reason":"stop"}]}"#;
        let base_a = serve_hung().await;
        let base_b = serve_once("200 OK", body.to_string()).await;

        let client =
            InferenceClient::from_config(test_config(&base_a, &base_b), Duration::from_secs(1))
                .unwrap();
        let budget = client.chain_budget();
        let mut bounded = Bounded::new(client, budget);

        let text = bounded.complete("hi").await.unwrap();
        assert_eq!(text, "from fallback");
    }

    #[tokio::test]
    async fn test_unreachable_primary_falls_back() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"from b"},"finish_reason":"stop"}]}"#;
        let base_b = serve_once("200 OK", body.to_string()).await;

        let mut client = InferenceClient::from_config(
            test_config("http://127.0.0.1:1", &base_b),
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();
        let text = client.complete("hi").await.unwrap();
        assert_eq!(text, "from b");
        assert_eq!(client.current_model_key, "model-b");
    }
}
