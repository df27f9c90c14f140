mod config;
mod errors;
mod grading;
mod llm_client;
mod persist;
mod questions;
mod report;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{BackendKind, Config};
use crate::llm_client::{ChatBackend, OpenAiBackend, SelfHostedBackend};
use crate::questions::QuestionBank;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing credentials)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interviewer API v{}", env!("CARGO_PKG_VERSION"));

    // Load the question bank (built-in unless QUESTIONS_PATH overrides it)
    let questions = match &config.questions_path {
        Some(path) => {
            let bank = QuestionBank::from_file(path)?;
            info!("Question bank loaded from {} ({} questions)", path.display(), bank.len());
            Arc::new(bank)
        }
        None => {
            let bank = QuestionBank::builtin();
            info!("Using built-in question bank ({} questions)", bank.len());
            Arc::new(bank)
        }
    };

    // Select the chat backend
    let chat: Arc<dyn ChatBackend> = match config.backend {
        BackendKind::OpenAi => {
            info!("Chat backend: hosted (default model: {})", config.default_model);
            Arc::new(OpenAiBackend::new(config.api_key.clone()))
        }
        BackendKind::SelfHosted => {
            let url = config
                .self_hosted_url
                .clone()
                .unwrap_or_default();
            info!("Chat backend: self-hosted at {url}");
            let token = (!config.api_key.is_empty()).then(|| config.api_key.clone());
            Arc::new(SelfHostedBackend::new(&url, token))
        }
    };

    // Build app state
    let state = AppState {
        sessions: SessionStore::new(),
        questions,
        chat,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
