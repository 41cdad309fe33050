/// LLM gateway: the single point of entry for all text-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call a model backend directly.
/// Callers build a backend-agnostic [`CompletionRequest`] and hand it to a
/// [`TextGenerator`]; the gateway turns it into the backend's wire format.
///
/// Each call is attempted exactly once. Retrying on quota exhaustion is the
/// caller's decision.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod gemini;
pub mod llama;
pub mod prompts;
#[cfg(test)]
pub(crate) mod testing;

pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Which model backend serves a request. Selected at call sites by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Llama,
    Gemini,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Llama => "llama",
            Backend::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = LlmError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "llama" => Ok(Backend::Llama),
            "gemini" => Ok(Backend::Gemini),
            other => Err(LlmError::InvalidRequest(format!(
                "unknown backend '{other}' (expected 'llama' or 'gemini')"
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0}: API key is required")]
    MissingCredential(Backend),

    #[error("{backend} rejected the API key (status {status})")]
    Unauthorized { backend: Backend, status: u16 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("{backend} quota exceeded: {message}")]
    QuotaExhausted { backend: Backend, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("invalid LLM request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Missing or rejected credentials, as opposed to a failing backend.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            LlmError::MissingCredential(_) | LlmError::Unauthorized { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Backend-agnostic completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub backend: Backend,
    pub temperature: f32,
    pub max_tokens: u32,
    pub model: Option<String>,
    /// Ask the backend for a JSON-only response where it supports that.
    pub json_response: bool,
}

impl CompletionRequest {
    /// A system message followed by one user message, with the default sampling settings.
    pub fn new(backend: Backend, system: &str, prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(prompt)],
            backend,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            model: None,
            json_response: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::InvalidRequest(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(LlmError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }
        if self.messages.is_empty() {
            return Err(LlmError::InvalidRequest("no messages".to_string()));
        }
        Ok(())
    }

    /// Text of the last user message, for stubs and diagnostics.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Anything that can turn a [`CompletionRequest`] into response text.
/// Carried in `AppState` as `Arc<dyn TextGenerator>` so tests can swap in a stub.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Endpoint and credential for one backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub url: String,
    pub api_key: Option<String>,
}

/// The HTTP gateway used in production. Holds one shared `reqwest::Client`.
#[derive(Clone)]
pub struct LlmGateway {
    client: Client,
    llama: BackendSettings,
    gemini: BackendSettings,
}

impl LlmGateway {
    pub fn new(
        llama: BackendSettings,
        gemini: BackendSettings,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            llama,
            gemini,
        })
    }

    pub fn has_credential(&self, backend: Backend) -> bool {
        self.settings(backend).api_key.is_some()
    }

    fn settings(&self, backend: Backend) -> &BackendSettings {
        match backend {
            Backend::Llama => &self.llama,
            Backend::Gemini => &self.gemini,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        request.validate()?;

        let settings = self.settings(request.backend);
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingCredential(request.backend))?;

        let text = match request.backend {
            Backend::Llama => llama::complete(&self.client, &settings.url, api_key, request).await?,
            Backend::Gemini => {
                gemini::complete(&self.client, &settings.url, api_key, request).await?
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        debug!(
            backend = %request.backend,
            chars = text.len(),
            "LLM call succeeded"
        );
        Ok(text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a non-success status to the gateway's error kinds. Both backends wrap
/// their error text as `{"error": {"message": ...}}`.
pub(crate) fn status_error(backend: Backend, status: StatusCode, body: String) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized {
            backend,
            status: status.as_u16(),
        },
        StatusCode::TOO_MANY_REQUESTS => LlmError::QuotaExhausted { backend, message },
        _ => LlmError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> BackendSettings {
        BackendSettings {
            url: "http://127.0.0.1:9/unused".to_string(),
            api_key: api_key.map(String::from),
        }
    }

    #[test]
    fn test_backend_tags() {
        assert_eq!("llama".parse::<Backend>().unwrap(), Backend::Llama);
        assert_eq!(" Gemini ".parse::<Backend>().unwrap(), Backend::Gemini);
        assert!(matches!(
            "gpt".parse::<Backend>(),
            Err(LlmError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_request_defaults_match_gateway_convention() {
        let request = CompletionRequest::new(Backend::Llama, "You are helpful.", "Hi");
        assert_eq!(request.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.messages[0], Message::system("You are helpful."));
        assert_eq!(request.prompt(), "Hi");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_settings() {
        let base = CompletionRequest::new(Backend::Gemini, "s", "p");
        assert!(base.clone().temperature(2.5).validate().is_err());
        assert!(base.clone().temperature(-0.1).validate().is_err());
        assert!(base.clone().max_tokens(0).validate().is_err());
        assert!(base.temperature(2.0).validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        let gateway = LlmGateway::new(
            settings(None),
            settings(Some("key")),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!gateway.has_credential(Backend::Llama));

        let err = gateway
            .complete(&CompletionRequest::new(Backend::Llama, "s", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential(Backend::Llama)));
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_credentials_are_checked() {
        let gateway =
            LlmGateway::new(settings(None), settings(None), Duration::from_secs(1)).unwrap();
        let err = gateway
            .complete(&CompletionRequest::new(Backend::Gemini, "s", "p").max_tokens(0))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn test_status_error_classification() {
        let err = status_error(
            Backend::Gemini,
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"message": "Resource has been exhausted"}}"#.to_string(),
        );
        match err {
            LlmError::QuotaExhausted { backend, message } => {
                assert_eq!(backend, Backend::Gemini);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = status_error(Backend::Llama, StatusCode::UNAUTHORIZED, String::new());
        assert!(err.is_authentication());

        let err = status_error(
            Backend::Llama,
            StatusCode::BAD_GATEWAY,
            "upstream down".to_string(),
        );
        assert!(matches!(err, LlmError::Api { status: 502, ref message } if message == "upstream down"));
    }
}
