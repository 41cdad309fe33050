//! Correlation analysis over the candidates of one job.
//!
//! Each candidate is a row and each stored field a column. Years of experience
//! and the average score are coerced to numbers (anything else is dropped);
//! other columns stay numeric when every value is a number and are otherwise
//! factorized in first-seen order.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::context::document::Collection;
use crate::context::ContextStore;
use crate::errors::{AppError, ERROR_GLYPH};
use crate::llm_client::prompts::{fill, DEFAULT_ROLE};
use crate::llm_client::{Backend, CompletionRequest, LlmError, TextGenerator};

pub mod handlers;
pub mod prompts;

use prompts::{EXPLAIN_PROMPT, FOLLOW_UP_PROMPT};

/// Columns that identify or describe a candidate rather than measure them.
const EXCLUDED_COLUMNS: &[&str] = &[
    "Name",
    "Email",
    "Key Skills",
    "Candidate ID",
    "Application ID",
    "Resume File",
    "Llama Summary",
    "Gemini Summary",
    "Note",
    "candidate_id",
    "job_id",
    "application_date",
    "source",
    "onboarding_docs",
];

/// Always coerced to numbers; non-numeric values count as missing.
const NUMERIC_COLUMNS: &[&str] = &["Years of Experience", "avg_score"];

/// Fields left out of the sample rows sent with follow-up questions.
const SAMPLE_DROPPED: &[&str] = &["Resume File", "Llama Summary", "Gemini Summary"];
const SAMPLE_ROWS: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum AnalyticsError {
    #[error("One or both columns not found: '{0}', '{1}'")]
    UnknownColumn(String, String),

    #[error("Cannot correlate a column with itself.")]
    SameColumn,

    #[error("Need at least two candidates with both values (found {0})")]
    InsufficientData(usize),

    #[error("'{0}' has the same value for every candidate")]
    ZeroVariance(String),
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        AppError::Validation(err.to_string())
    }
}

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Serialize)]
pub struct Correlation {
    pub col1: String,
    pub col2: String,
    pub value: f64,
    pub rows: usize,
}

/// Raw candidate rows linked to `job_id`.
pub async fn candidate_rows(store: &ContextStore, job_id: &str) -> Result<Vec<Row>, AppError> {
    let candidates = store.get_all_entities(Collection::Candidates).await?;
    Ok(candidates
        .into_iter()
        .filter_map(|(_, value)| match value {
            Value::Object(row) if row.get("job_id").and_then(Value::as_str) == Some(job_id) => {
                Some(row)
            }
            _ => None,
        })
        .collect())
}

/// Columns offered for correlation, in sorted order.
pub fn available_columns(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.keys())
        .filter(|key| !EXCLUDED_COLUMNS.contains(&key.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn correlate(rows: &[Row], col1: &str, col2: &str) -> Result<Correlation, AnalyticsError> {
    let present = |col: &str| rows.iter().any(|row| row.contains_key(col));
    if !present(col1) || !present(col2) {
        return Err(AnalyticsError::UnknownColumn(col1.to_string(), col2.to_string()));
    }
    if col1 == col2 {
        return Err(AnalyticsError::SameColumn);
    }

    let first = column_values(rows, col1);
    let second = column_values(rows, col2);
    let (xs, ys): (Vec<f64>, Vec<f64>) = first
        .into_iter()
        .zip(second)
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .unzip();

    if xs.len() < 2 {
        return Err(AnalyticsError::InsufficientData(xs.len()));
    }
    let value = pearson(&xs, &ys).ok_or_else(|| {
        let flat = if variance(&xs) == 0.0 { col1 } else { col2 };
        AnalyticsError::ZeroVariance(flat.to_string())
    })?;

    Ok(Correlation {
        col1: col1.to_string(),
        col2: col2.to_string(),
        value,
        rows: xs.len(),
    })
}

/// Numeric encoding of one column, `None` where the value is missing.
fn column_values(rows: &[Row], col: &str) -> Vec<Option<f64>> {
    let raw: Vec<Option<&Value>> = rows
        .iter()
        .map(|row| row.get(col).filter(|v| !v.is_null()))
        .collect();

    if NUMERIC_COLUMNS.contains(&col) {
        return raw.into_iter().map(|v| v.and_then(to_number)).collect();
    }
    if raw.iter().flatten().all(|v| v.is_number()) {
        return raw.into_iter().map(|v| v.and_then(Value::as_f64)).collect();
    }

    let mut codes: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .map(|v| {
            v.map(|value| {
                let key = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let next = codes.len();
                *codes.entry(key).or_insert(next) as f64
            })
        })
        .collect()
}

fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Pearson's r, or `None` when either side is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let (mx, my) = (mean(xs), mean(ys));
    let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let denom = (variance(xs) * variance(ys)).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

/// Recruiter-facing explanation. Failures are returned as the message text.
pub async fn explain(llm: &dyn TextGenerator, correlation: &Correlation) -> String {
    let value = format!("{:.4}", correlation.value);
    let prompt = fill(
        EXPLAIN_PROMPT,
        &[
            ("col1", correlation.col1.as_str()),
            ("col2", correlation.col2.as_str()),
            ("value", value.as_str()),
        ],
    );
    let request = CompletionRequest::new(Backend::Gemini, DEFAULT_ROLE, prompt);
    degrade(llm.complete(&request).await)
}

/// Answers a follow-up question about a correlation using a sample of the rows.
pub async fn follow_up(
    llm: &dyn TextGenerator,
    rows: &[Row],
    correlation: &Correlation,
    question: &str,
) -> Result<String, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Validation(
            "Please enter a follow-up question.".to_string(),
        ));
    }
    if rows.is_empty() {
        return Err(AppError::Validation("No candidate data loaded.".to_string()));
    }

    let sample: Vec<Row> = rows
        .iter()
        .take(SAMPLE_ROWS)
        .map(|row| {
            row.iter()
                .filter(|(k, _)| !SAMPLE_DROPPED.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .collect();
    let sample = serde_json::to_string_pretty(&sample).map_err(anyhow::Error::new)?;
    let value = format!("{:.4}", correlation.value);

    let prompt = fill(
        FOLLOW_UP_PROMPT,
        &[
            ("col1", correlation.col1.as_str()),
            ("col2", correlation.col2.as_str()),
            ("value", value.as_str()),
            ("question", question),
            ("sample", sample.as_str()),
        ],
    );
    let request = CompletionRequest::new(Backend::Gemini, DEFAULT_ROLE, prompt);
    Ok(degrade(llm.complete(&request).await))
}

fn degrade(result: Result<String, LlmError>) -> String {
    match result {
        Ok(text) => text.trim().to_string(),
        Err(LlmError::QuotaExhausted { .. }) => {
            warn!("Gemini quota exhausted during correlation analysis");
            format!("{ERROR_GLYPH} Gemini quota exceeded. Try again soon.")
        }
        Err(err) => {
            warn!("Correlation explanation failed: {err}");
            AppError::from(err).user_message()
        }
    }
}

/// Loads the job's rows and correlates two columns.
pub async fn correlate_for_job(
    store: &ContextStore,
    job_id: &str,
    col1: &str,
    col2: &str,
) -> Result<(Vec<Row>, Correlation), AppError> {
    let rows = candidate_rows(store, job_id).await?;
    if rows.is_empty() {
        return Err(AppError::Validation(
            "Please select a job with candidates.".to_string(),
        ));
    }
    let correlation = correlate(&rows, col1, col2)?;
    info!(
        "Correlation {col1} vs {col2} for job {job_id}: {:.4} over {} rows",
        correlation.value, correlation.rows
    );
    Ok((rows, correlation))
}
