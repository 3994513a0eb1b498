//! Model registry configuration.
//!
//! The `models` section of `storechat.yaml`: endpoints, credentials, sampling
//! defaults and the fallback chain. File loading and `${VAR}` interpolation
//! live in [`crate::config`]; this module only resolves and validates.

use std::collections::HashMap;

use serde::Deserialize;

use super::errors::InferenceError;

/// Runtimes that serve models locally and never need a credential.
const LOCAL_RUNTIMES: &[&str] = &["ollama", "llama_cpp", "vllm"];

// ─── Public Types ────────────────────────────────────────────────────────────

/// A single model's runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub display_name: String,
    pub runtime: String,
    #[serde(default)]
    pub model_name: Option<String>,
    pub base_url: String,
    /// Bearer credential. An empty string after interpolation counts as unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}

impl ModelConfig {
    /// Whether this model is served by a hosted provider that needs a key.
    pub fn requires_api_key(&self) -> bool {
        !LOCAL_RUNTIMES.contains(&self.runtime.as_str())
    }

    /// The configured API key, if it is non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Top-level model registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    pub active_model: String,
    pub models: HashMap<String, ModelConfig>,
    #[serde(default)]
    pub fallback_chain: Vec<String>,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve the active model configuration, respecting the fallback chain.
///
/// Returns `(model_key, ModelConfig)` for the first model present in the
/// registry. Connectivity is checked at runtime by the client.
pub fn resolve_active_model(config: &ModelsConfig) -> Result<(String, ModelConfig), InferenceError> {
    if let Some(model) = config.models.get(&config.active_model) {
        return Ok((config.active_model.clone(), model.clone()));
    }

    for key in &config.fallback_chain {
        if let Some(model) = config.models.get(key) {
            return Ok((key.clone(), model.clone()));
        }
    }

    Err(InferenceError::ConfigError {
        reason: format!(
            "active model '{}' not found in config and no fallback available",
            config.active_model
        ),
    })
}

/// Check that every model the client may use has the credential it needs.
///
/// Runs at startup. A missing key is fatal before any turn begins.
pub fn validate_credentials(config: &ModelsConfig) -> Result<(), InferenceError> {
    let (active_key, _) = resolve_active_model(config)?;

    let mut keys = vec![active_key];
    keys.extend(config.fallback_chain.iter().cloned());

    for key in keys {
        let Some(model) = config.models.get(&key) else {
            continue;
        };
        if model.requires_api_key() && model.api_key().is_none() {
            return Err(InferenceError::MissingCredential { model: key });
        }
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(yaml: &str) -> ModelsConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    const TWO_MODELS: &str = r#"
        active_model: gemini
        fallback_chain: [gemini, local]
        models:
          gemini:
            display_name: "Gemini Flash"
            runtime: gemini
            base_url: "https://example.invalid/v1beta/openai"
            api_key: "secret"
          local:
            display_name: "Local Llama"
            runtime: ollama
            base_url: "http://localhost:11434/v1"
    "#;

    #[test]
    fn test_defaults_applied() {
        let config = registry(TWO_MODELS);
        let local = config.models.get("local").unwrap();
        assert_eq!(local.max_tokens, 2048);
        assert!((local.temperature - 0.2).abs() < f32::EPSILON);
        assert!(local.api_key.is_none());
    }

    #[test]
    fn test_resolve_active_model() {
        let config = registry(TWO_MODELS);
        let (key, model) = resolve_active_model(&config).unwrap();
        assert_eq!(key, "gemini");
        assert_eq!(model.display_name, "Gemini Flash");
    }

    #[test]
    fn test_resolve_walks_fallback_chain() {
        let mut config = registry(TWO_MODELS);
        config.active_model = "missing".into();
        let (key, _) = resolve_active_model(&config).unwrap();
        assert_eq!(key, "gemini");
    }

    #[test]
    fn test_resolve_active_model_not_found() {
        let config = ModelsConfig {
            active_model: "nonexistent".into(),
            models: HashMap::new(),
            fallback_chain: vec![],
        };
        assert!(resolve_active_model(&config).is_err());
    }

    #[test]
    fn test_local_runtime_needs_no_key() {
        let mut config = registry(TWO_MODELS);
        config.active_model = "local".into();
        config.fallback_chain = vec!["local".into()];
        assert!(validate_credentials(&config).is_ok());
    }

    #[test]
    fn test_blank_key_is_missing_credential() {
        let mut config = registry(TWO_MODELS);
        config.models.get_mut("gemini").unwrap().api_key = Some("   ".into());
        let err = validate_credentials(&config).unwrap_err();
        assert!(matches!(err, InferenceError::MissingCredential { ref model } if model == "gemini"));
    }
}
