use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mindnest_types::api::{AiConversationRequest, AiConversationResponse, Claims};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

const MAX_TOKENS: u32 = 100;
const FAILURE: &str = "Something went wrong!";

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
    /// e.g. `https://api.openai.com/v1`
    pub base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

pub async fn converse(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<AiConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }
    let config = state
        .ai
        .as_ref()
        .ok_or_else(|| ApiError::internal(FAILURE, anyhow::anyhow!("AI conversation is not configured")))?;

    debug!(user = %claims.sub, session = ?req.session_id, "AI conversation turn");
    let content = complete(&state.http, config, message)
        .await
        .map_err(|e| ApiError::internal(FAILURE, e))?;

    Ok(Json(AiConversationResponse { content }))
}

async fn complete(http: &reqwest::Client, config: &AiConfig, message: &str) -> anyhow::Result<String> {
    let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
    let body = ChatRequest {
        model: &config.model,
        messages: [ChatMessage { role: "user", content: message }],
        max_tokens: MAX_TOKENS,
    };

    let reply: ChatResponse = http
        .post(&url)
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow::anyhow!("completion response had no content"))
}
