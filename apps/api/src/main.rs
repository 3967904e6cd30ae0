mod chat;
mod config;
mod context;
mod errors;
mod gateway;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::context::ContextStore;
use crate::gateway::AssistantGateway;
use crate::llm_client::{GeminiClient, GenerativeModel};
use crate::routes::build_router;
use crate::state::AppState;

/// Chat backend answering questions about a single professional profile.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// List models available to the configured key that support generateContent
    CheckModels,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CheckModels => check_models(&config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting profile chat API v{}", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(ContextStore::load(&config.content_dir));

    let model: Option<Arc<dyn GenerativeModel>> = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(client) as Arc<dyn GenerativeModel>)
        }
        None => {
            warn!("GEMINI_API_KEY not found; AI responses will use fallback values");
            None
        }
    };

    let gateway = Arc::new(AssistantGateway::new(model, store.clone()));
    info!("Allowed origins: {:?}", config.allowed_origins);

    let state = AppState {
        store,
        gateway,
        config: config.clone(),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn check_models(config: &Config) -> Result<()> {
    let key = config
        .gemini_api_key
        .clone()
        .context("GEMINI_API_KEY must be set to list models")?;
    let client = GeminiClient::new(key)?;

    println!("--- Available Models ---");
    let models = client.list_models().await.context("Error listing models")?;
    for model in models.iter().filter(|m| m.supports_generate_content()) {
        println!("Model ID: {}", model.name);
        println!("   - Display Name: {}", model.display_name);
    }

    Ok(())
}
