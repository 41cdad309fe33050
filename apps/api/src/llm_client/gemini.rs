//! Gemini backend: REST `generateContent`.
//!
//! Gemini takes a single prompt here, so system and user contents are joined
//! with ". " in message order before sending.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm_client::{status_error, Backend, CompletionRequest, LlmError};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

pub(crate) fn combined_prompt(request: &CompletionRequest) -> String {
    request
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(". ")
}

pub(crate) fn build_body(request: &CompletionRequest) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part {
                text: Some(combined_prompt(request)),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            response_mime_type: request.json_response.then_some("application/json"),
        },
    }
}

pub(crate) fn endpoint(base_url: &str, request: &CompletionRequest) -> String {
    let model = request.model.as_deref().unwrap_or(DEFAULT_MODEL);
    format!("{}/{model}:generateContent", base_url.trim_end_matches('/'))
}

pub(crate) fn parse_body(body: &str) -> Result<String, LlmError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .concat()
        })
        .unwrap_or_default();
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(text)
}

pub(crate) async fn complete(
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &CompletionRequest,
) -> Result<String, LlmError> {
    let response = client
        .post(endpoint(base_url, request))
        .header("x-goog-api-key", api_key)
        .json(&build_body(request))
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(status_error(Backend::Gemini, status, body));
    }
    parse_body(&body)
}
