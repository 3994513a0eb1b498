//! Inference Client: OpenAI-compatible API client for the hosted or local LLM.
//!
//! This module is the Model Gateway behind the chat core:
//! - Non-streaming chat completions carrying a single prompt
//! - Fallback chain management across configured models
//! - Model registry types (the `models` section of `storechat.yaml`)
//!
//! The client speaks the OpenAI Chat Completions API, so switching from
//! Gemini's OpenAI endpoint to a local Ollama model is a config change,
//! not a code change.

pub mod client;
pub mod config;
pub mod errors;
pub mod response;
pub mod types;

// Re-exports for convenience
pub use client::InferenceClient;
pub use config::{ModelConfig, ModelsConfig};
pub use errors::InferenceError;
pub use types::{ChatMessage, Role};
