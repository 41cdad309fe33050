use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::context::error::StoreError;
use crate::llm_client::LlmError;
use crate::scheduling::SchedulingError;

/// Glyph prefixed to every user-facing failure message.
pub const ERROR_GLYPH: &str = "❌";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A backend credential is missing or was rejected.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Transport failure, bad status, malformed body or quota exhaustion.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Model output did not contain the structured data that was asked for.
    #[error("Extraction error: {message}")]
    Extraction { message: String, raw: String },

    #[error("Corrupt state: {0}")]
    CorruptState(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short message shown in place of the expected content.
    pub fn user_message(&self) -> String {
        let detail = match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Authentication(msg) => format!("Authentication failed: {msg}"),
            AppError::Backend(msg) => format!("LLM request failed: {msg}"),
            AppError::Extraction { message, .. } => format!("LLM field extraction failed: {message}"),
            AppError::CorruptState(_) => {
                "Stored data could not be read. Try again shortly.".to_string()
            }
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        };
        format!("{ERROR_GLYPH} {detail}")
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        if err.is_authentication() {
            AppError::Authentication(err.to_string())
        } else if let LlmError::InvalidRequest(msg) = err {
            AppError::Validation(msg)
        } else {
            AppError::Backend(err.to_string())
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CorruptState { .. } | StoreError::Decode { .. } => {
                AppError::CorruptState(err.to_string())
            }
            StoreError::Missing { collection, id } => {
                AppError::NotFound(format!("{collection} entry {id} not found"))
            }
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        if err.is_authentication() {
            AppError::Authentication(err.to_string())
        } else {
            AppError::Backend(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Authentication(msg) => {
                tracing::warn!("Backend authentication error: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, "AUTHENTICATION_ERROR")
            }
            AppError::Backend(msg) => {
                tracing::error!("Backend error: {msg}");
                (StatusCode::BAD_GATEWAY, "BACKEND_ERROR")
            }
            AppError::Extraction { message, raw } => {
                tracing::warn!("Extraction error: {message}; raw response: {raw:?}");
                (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_ERROR")
            }
            AppError::CorruptState(msg) => {
                tracing::error!("Corrupt state: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "CORRUPT_STATE")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Backend;

    #[test]
    fn test_user_message_is_prefixed() {
        let err = AppError::Validation("Select a resume and a job.".to_string());
        assert_eq!(err.user_message(), "❌ Select a resume and a job.");
    }

    #[test]
    fn test_llm_errors_map_to_taxonomy() {
        let auth: AppError = LlmError::MissingCredential(Backend::Gemini).into();
        assert!(matches!(auth, AppError::Authentication(_)));

        let quota: AppError = LlmError::QuotaExhausted {
            backend: Backend::Gemini,
            message: "exhausted".to_string(),
        }
        .into();
        assert!(matches!(quota, AppError::Backend(_)));

        let invalid: AppError = LlmError::InvalidRequest("bad".to_string()).into();
        assert!(matches!(invalid, AppError::Validation(_)));
    }

    #[test]
    fn test_corrupt_store_maps_to_corrupt_state() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: AppError = StoreError::CorruptState {
            path: "/tmp/data/context.json".into(),
            source,
        }
        .into();
        assert!(matches!(err, AppError::CorruptState(_)));
    }

    #[test]
    fn test_missing_entity_maps_to_not_found() {
        let err: AppError = StoreError::Missing {
            collection: crate::context::document::Collection::Candidates,
            id: "c1".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::NotFound("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = AppError::Extraction {
            message: "no JSON object".to_string(),
            raw: "sure!".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
