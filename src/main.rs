//! StoreChat terminal session.
//!
//! Usage:
//! ```bash
//! # Use storechat.yaml found upward from the working directory
//! storechat
//!
//! # Explicit config and store, creating the tables on first run
//! storechat --config ./storechat.yaml --database ./store.db --bootstrap-schema
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use storechat::chat::{SessionSettings, TurnOrchestrator};
use storechat::config::{find_config_path, load_config};
use storechat::inference::InferenceClient;
use storechat::store::StoreDatabase;

#[derive(Parser)]
#[command(
    name = "storechat",
    version,
    about = "Natural-language shopping assistant backed by an e-commerce SQL store"
)]
struct Cli {
    /// Config file (default: $STORECHAT_CONFIG, then storechat.yaml searched upward)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Store database path, overriding `database.path`
    #[arg(long, env = "STORECHAT_DB")]
    database: Option<String>,

    /// Create the e-commerce tables before the session starts
    #[arg(long)]
    bootstrap_schema: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = storechat::init_tracing().context("failed to initialise logging")?;

    let config_path = match cli.config {
        Some(path) => path,
        None => find_config_path(&std::env::current_dir()?)?,
    };
    let mut config = load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }
    if cli.bootstrap_schema {
        config.database.bootstrap_schema = true;
    }
    config.validate()?;
    tracing::info!(config = %config_path.display(), "config loaded");

    let db_path = config.database.resolved_path();
    let db_path_str = db_path.display().to_string();
    if config.database.bootstrap_schema {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        StoreDatabase::open(&db_path_str, false)?.bootstrap_schema()?;
    }
    let store = StoreDatabase::open(&db_path_str, config.database.read_only)
        .with_context(|| format!("failed to open store at {db_path_str}"))?;

    let mut settings = SessionSettings::from_config(&config);
    let request_timeout = settings
        .model_timeout
        .unwrap_or(storechat::inference::client::DEFAULT_REQUEST_TIMEOUT);
    let client = InferenceClient::from_config(config.models.clone(), request_timeout)?;
    // model_timeout_secs bounds each request; one model call may walk the whole chain
    settings.model_timeout = settings.model_timeout.map(|_| client.chain_budget());

    match client.health_check().await {
        Ok(true) => tracing::info!(model = client.current_model_name(), "model endpoint reachable"),
        Ok(false) | Err(_) => {
            tracing::warn!(endpoint = client.current_base_url(), "model endpoint not reachable");
            eprintln!(
                "warning: model endpoint {} is not reachable; replies may fall back",
                client.current_base_url()
            );
        }
    }

    println!("StoreChat {} ({})", env!("CARGO_PKG_VERSION"), client.current_model_name());
    println!("Ask about products and categories. Type 'exit' or 'quit' to leave.");
    println!("Logs: {}", log_path.display());

    let mut orchestrator = TurnOrchestrator::new(client, store, settings);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    orchestrator.run_session(stdin, tokio::io::stdout()).await?;

    Ok(())
}
