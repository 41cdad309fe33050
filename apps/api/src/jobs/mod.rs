//! Job postings: LLM-assisted drafting, metadata extraction and persistence.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::document::Collection;
use crate::context::models::{lenient_years, JobRecord};
use crate::context::ContextStore;
use crate::errors::AppError;
use crate::evaluation::extraction::strip_json_fences;
use crate::llm_client::prompts::{fill, DEFAULT_ROLE, JSON_ONLY_SYSTEM};
use crate::llm_client::{Backend, CompletionRequest, TextGenerator};

pub mod handlers;
pub mod prompts;

use prompts::{DRAFT_PROMPT, METADATA_PROMPT};

pub const UNTITLED: &str = "Untitled";
pub const GENERAL: &str = "General";

/// Fields pulled out of a drafted description. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub years_required: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewJob {
    pub job_description: String,
    pub compensation: Option<String>,
    pub start_date: Option<String>,
    pub clauses: Option<String>,
    pub policies: Option<String>,
    pub legal_notes: Option<String>,
    pub notes: Option<String>,
    pub team_profiles: Option<String>,
}

/// Partial update of a saved job. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compensation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clauses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_profiles: Option<String>,
}

/// Chat-style job description drafting from a recruiter prompt.
pub async fn draft_job_description(
    llm: &dyn TextGenerator,
    user_input: &str,
) -> Result<String, AppError> {
    let user_input = user_input.trim();
    if user_input.is_empty() {
        return Err(AppError::Validation("Please enter a prompt.".to_string()));
    }
    let request = CompletionRequest::new(
        Backend::Llama,
        DEFAULT_ROLE,
        fill(DRAFT_PROMPT, &[("user_input", user_input)]),
    )
    .temperature(0.9)
    .max_tokens(1000);
    Ok(llm.complete(&request).await?.trim().to_string())
}

/// Extracts title, specialization and years required. An unparseable reply
/// yields empty metadata; a failing backend is an error.
pub async fn extract_job_metadata(
    llm: &dyn TextGenerator,
    job_description: &str,
) -> Result<JobMetadata, AppError> {
    let request = CompletionRequest::new(
        Backend::Llama,
        JSON_ONLY_SYSTEM,
        fill(METADATA_PROMPT, &[("job_description", job_description)]),
    )
    .temperature(0.2)
    .max_tokens(200)
    .json();
    let raw = llm.complete(&request).await?;

    match serde_json::from_str::<JobMetadata>(strip_json_fences(&raw)) {
        Ok(metadata) => Ok(metadata),
        Err(e) => {
            warn!("Failed to parse job metadata response: {e}");
            Ok(JobMetadata::default())
        }
    }
}

/// Saves a drafted job under a fresh id, filling title and specialization
/// with fallbacks when extraction gives nothing.
pub async fn create_job(
    store: &ContextStore,
    llm: &dyn TextGenerator,
    new_job: NewJob,
) -> Result<JobRecord, AppError> {
    let description = new_job.job_description.trim();
    if description.is_empty() {
        return Err(AppError::Validation("No job to save.".to_string()));
    }

    let metadata = extract_job_metadata(llm, description).await?;
    let job = JobRecord {
        job_id: Uuid::new_v4().to_string(),
        title: Some(non_blank(metadata.job_title).unwrap_or_else(|| UNTITLED.to_string())),
        specialization: Some(
            non_blank(metadata.specialization).unwrap_or_else(|| GENERAL.to_string()),
        ),
        years_required: metadata.years_required,
        job_description: Some(description.to_string()),
        compensation: non_blank(new_job.compensation),
        start_date: non_blank(new_job.start_date),
        clauses: non_blank(new_job.clauses),
        policies: non_blank(new_job.policies),
        legal_notes: non_blank(new_job.legal_notes),
        notes: non_blank(new_job.notes),
        team_profiles: non_blank(new_job.team_profiles),
        ..Default::default()
    };
    store.put_job(&job).await?;

    info!("Job saved: {} ({})", job.title_or_default(), job.job_id);
    Ok(job)
}

/// Applies `update` to a saved job in one serialized write.
pub async fn update_job(
    store: &ContextStore,
    job_id: &str,
    update: JobUpdate,
) -> Result<JobRecord, AppError> {
    store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let patch = match serde_json::to_value(&update).map_err(anyhow::Error::new)? {
        Value::Object(map) => map,
        _ => return Err(AppError::Validation("Job update must be an object".to_string())),
    };
    let written = store
        .update_existing_entity(Collection::Jobs, job_id, move |value| {
            if let Value::Object(fields) = value {
                fields.extend(patch);
            }
        })
        .await?;

    let job: JobRecord = serde_json::from_value(written).map_err(anyhow::Error::new)?;
    info!("Job updated: {}", job.job_id);
    Ok(job)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
