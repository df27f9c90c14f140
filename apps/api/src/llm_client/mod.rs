/// LLM Client — the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may talk to an LLM endpoint directly.
/// All grading and narrative calls MUST go through a `ChatBackend`.
///
/// Two backends are provided: the hosted chat API and an OpenAI-compatible
/// self-hosted endpoint. Everything above this module is backend-agnostic and
/// must not branch on which backend is active.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One chat-completion request. The caller pins temperature and max tokens:
/// grading runs at 0.0, the narrative at 0.2.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The chat backend seam. Carried in `AppState` as `Arc<dyn ChatBackend>`;
/// swap implementations at startup via `LLM_BACKEND` without touching callers.
///
/// A single call per request — failed calls are NOT retried here. The grading
/// adapter converts failures into score-0 `error` evaluations and the user may
/// re-submit manually.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn build_http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

/// Shared request/response plumbing for both backends.
async fn post_chat_completion(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
    request: &ChatRequest<'_>,
) -> Result<String, LlmError> {
    let body = ChatCompletionBody {
        model: request.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: request.system,
            },
            ChatMessage {
                role: "user",
                content: &request.user,
            },
        ],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    };

    let mut builder = client
        .post(url)
        .header("content-type", "application/json")
        .json(&body);
    if let Some(token) = bearer {
        builder = builder.bearer_auth(token);
    }

    let response = builder.send().await?;
    let status = response.status();

    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        // Try to pull the structured error message out of the body
        let message = serde_json::from_str::<ApiError>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);
        return Err(LlmError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let completion: ChatCompletionResponse = response.json().await?;

    if let Some(usage) = &completion.usage {
        debug!(
            "chat completion: prompt_tokens={}, completion_tokens={}",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or(LlmError::EmptyContent)
}

/// Hosted chat API backend.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_http_client(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, LlmError> {
        post_chat_completion(&self.client, OPENAI_API_URL, Some(&self.api_key), &request).await
    }
}

/// Self-hosted backend speaking the same chat-completions wire format
/// (vLLM, Ollama, llama.cpp server). Auth token is optional.
pub struct SelfHostedBackend {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl SelfHostedBackend {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: build_http_client(),
            url: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        }
    }
}

#[async_trait]
impl ChatBackend for SelfHostedBackend {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, LlmError> {
        post_chat_completion(&self.client, &self.url, self.api_key.as_deref(), &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_body_serializes_role_tagged_messages() {
        let body = ChatCompletionBody {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "grade strictly",
                },
                ChatMessage {
                    role: "user",
                    content: "Q and A",
                },
            ],
            temperature: 0.0,
            max_tokens: 350,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Q and A");
        assert_eq!(json["max_tokens"], 350);
    }

    #[test]
    fn test_completion_response_extracts_first_choice() {
        let raw = r#"{
            "choices": [{"message": {"content": "  hello  "}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let resp: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap();
        assert_eq!(content.trim(), "hello");
    }

    #[test]
    fn test_self_hosted_url_normalizes_trailing_slash() {
        let backend = SelfHostedBackend::new("http://localhost:8000/", None);
        assert_eq!(backend.url, "http://localhost:8000/v1/chat/completions");
    }
}
