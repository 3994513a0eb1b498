//! Application configuration (`storechat.yaml`).
//!
//! One YAML file holds the model registry (flattened at the top level), the
//! store location and the per-session limits. String values may reference
//! environment variables as `${VAR}` or `${VAR:-default}`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::inference::config::validate_credentials;
use crate::inference::ModelsConfig;

/// File name searched for when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "storechat.yaml";

/// Env var pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "STORECHAT_CONFIG";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not find {CONFIG_FILE_NAME} (searched upward from {searched})")]
    NotFound { searched: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

// ─── Public Types ────────────────────────────────────────────────────────────

/// Everything in `storechat.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Where the store lives and how it is opened.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Open with `SQLITE_OPEN_READ_ONLY`.
    #[serde(default = "default_true")]
    pub read_only: bool,
    /// Create the e-commerce tables at startup if missing.
    #[serde(default)]
    pub bootstrap_schema: bool,
    /// Dialect named in the synthesis prompt.
    #[serde(default = "default_dialect")]
    pub dialect: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            read_only: true,
            bootstrap_schema: false,
            dialect: default_dialect(),
        }
    }
}

impl DatabaseConfig {
    /// The store path with a leading `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(expand_tilde(&self.path))
    }
}

/// Per-call limits. `0` disables a limit.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Per model request. A whole model call gets this once per model in the
    /// fallback chain.
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model_timeout_secs: default_model_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

fn default_database_path() -> String {
    crate::data_dir().join("store.db").display().to_string()
}
fn default_true() -> bool {
    true
}
fn default_dialect() -> String {
    "SQLite".to_string()
}
fn default_model_timeout_secs() -> u64 {
    60
}
fn default_query_timeout_secs() -> u64 {
    15
}

impl AppConfig {
    /// Startup checks. Any failure here is fatal before the first turn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_credentials(&self.models).map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "database.path is empty".into(),
            });
        }
        Ok(())
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// `STORECHAT_CONFIG` wins if it names an existing file; otherwise searches
/// upward from `start` for `storechat.yaml`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&path));
        if candidate.is_file() {
            return Ok(candidate);
        }
        tracing::warn!(path = %candidate.display(), "{CONFIG_ENV_VAR} does not name a file");
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(ConfigError::NotFound {
        searched: start.display().to_string(),
    })
}

/// Read, interpolate and parse a config file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    parse_config(&raw)
}

/// Parse config text after `${VAR}` interpolation.
pub fn parse_config(raw: &str) -> Result<AppConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);
    serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();
        let expr: String = chars.by_ref().take_while(|&c| c != '}').collect();
        result.push_str(&resolve_var_expr(&expr));
    }

    result
}

/// `VAR` or `VAR:-default`. An unset or empty variable takes the default.
fn resolve_var_expr(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((name, default)) => std::env::var(name)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| expand_tilde(default)),
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
