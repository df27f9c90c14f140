use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Models the hosted backend accepts. Session creation validates against this
/// list; the first entry is the fallback when `DEFAULT_MODEL` is unset.
pub const ALLOWED_MODELS: &[&str] = &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"];

/// Which chat-completion backend serves grading calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted chat API (api.openai.com).
    OpenAi,
    /// OpenAI-compatible self-hosted inference endpoint (vLLM, Ollama, ...).
    SelfHosted,
}

/// Application configuration loaded from environment variables.
/// Missing credentials are fatal at startup — no session may be created
/// without a working grading backend.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    /// Required for the hosted backend; optional bearer token for self-hosted.
    pub api_key: String,
    /// Base URL of the self-hosted endpoint, e.g. "http://localhost:8000".
    pub self_hosted_url: Option<String>,
    pub default_model: String,
    /// Optional JSON file overriding the built-in question bank.
    pub questions_path: Option<PathBuf>,
    /// Directory transcripts are persisted into.
    pub data_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // key.env is the legacy location for the API key; .env wins if both exist.
        dotenvy::from_filename("key.env").ok();
        dotenvy::dotenv().ok();

        let backend = match std::env::var("LLM_BACKEND")
            .unwrap_or_else(|_| "openai".to_string())
            .as_str()
        {
            "openai" => BackendKind::OpenAi,
            "self_hosted" => BackendKind::SelfHosted,
            other => bail!("LLM_BACKEND must be 'openai' or 'self_hosted', got '{other}'"),
        };

        let api_key = match backend {
            BackendKind::OpenAi => require_env("OPENAI_API_KEY")?,
            // Self-hosted endpoints often run without auth; token is optional.
            BackendKind::SelfHosted => std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        };

        let self_hosted_url = match backend {
            BackendKind::SelfHosted => Some(require_env("SELF_HOSTED_URL")?),
            BackendKind::OpenAi => None,
        };

        Ok(Config {
            backend,
            api_key,
            self_hosted_url,
            default_model: std::env::var("DEFAULT_MODEL")
                .unwrap_or_else(|_| ALLOWED_MODELS[0].to_string()),
            questions_path: std::env::var("QUESTIONS_PATH").ok().map(PathBuf::from),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("transcripts")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
