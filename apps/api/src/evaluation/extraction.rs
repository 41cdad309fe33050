//! Strict parsing of the structured-field extraction response.
//!
//! The extraction call asks the backend for a JSON object. The reply may be
//! wrapped in a markdown code fence; after removing that, the remainder must be
//! exactly one JSON object. Anything else is an `ExtractionError` carrying the
//! raw text. There is no scan for brace-delimited fragments inside prose.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::models::lenient_skills;
use crate::errors::AppError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Years of Experience", default)]
    pub years_of_experience: Option<Value>,
    #[serde(rename = "Key Skills", default, deserialize_with = "lenient_skills")]
    pub key_skills: Vec<String>,
    #[serde(rename = "Llama Score", default)]
    pub llama_score: Option<Value>,
}

/// Parses an extraction reply into [`ExtractedFields`].
pub fn parse_extraction(raw: &str) -> Result<ExtractedFields, AppError> {
    let text = strip_json_fences(raw);
    if text.is_empty() {
        return Err(extraction_error("response was empty", raw));
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| extraction_error(&format!("response is not valid JSON ({e})"), raw))?;
    if !value.is_object() {
        return Err(extraction_error("expected a single JSON object", raw));
    }

    serde_json::from_value(value)
        .map_err(|e| extraction_error(&format!("unexpected field types ({e})"), raw))
}

fn extraction_error(message: &str, raw: &str) -> AppError {
    AppError::Extraction {
        message: message.to_string(),
        raw: raw.to_string(),
    }
}

/// Removes a surrounding markdown code fence, whatever its info string
/// (`json`, `JSON`, none). An unterminated fence keeps the rest of the text.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = match body.split_once('\n') {
        Some((info, rest)) if info.trim().chars().all(|c| c.is_ascii_alphanumeric()) => rest,
        _ => body,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
