//! Llama backend: OpenAI-compatible chat completions over HTTPS with a bearer token.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm_client::{status_error, Backend, CompletionRequest, LlmError, Message};

pub const DEFAULT_MODEL: &str = "llama-3";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    messages: &'a [Message],
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub(crate) fn build_body(request: &CompletionRequest) -> ChatRequest<'_> {
    ChatRequest {
        messages: &request.messages,
        model: request.model.as_deref().unwrap_or(DEFAULT_MODEL),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stream: false,
        n: 1,
        response_format: request.json_response.then_some(ResponseFormat {
            kind: "json_object",
        }),
    }
}

pub(crate) fn parse_body(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(LlmError::EmptyContent)
}

pub(crate) async fn complete(
    client: &Client,
    url: &str,
    api_key: &str,
    request: &CompletionRequest,
) -> Result<String, LlmError> {
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(&build_body(request))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(status_error(Backend::Llama, status, body));
    }
    parse_body(&body)
}
