//! Interview invitations: a personalized scheduling link plus an LLM-drafted
//! email per selected candidate, saved as text under the job's `emails/` dir.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::artifacts::{artifact_dir, artifact_path, file_stem, io_failure, write_artifact, ArtifactKind};
use crate::context::models::{CandidateRecord, JobRecord};
use crate::context::ContextStore;
use crate::errors::AppError;
use crate::llm_client::prompts::{fill, DEFAULT_ROLE};
use crate::llm_client::{Backend, CompletionRequest, TextGenerator};
use crate::scheduling::SchedulingService;

pub mod handlers;
pub mod prompts;

use prompts::{INVITE_PROMPT, REVISE_PROMPT};

/// Per-candidate result of an invite batch. Failures are reported inline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InviteResult {
    Drafted {
        candidate_id: String,
        name: String,
        link: String,
        file_name: String,
        email_text: String,
    },
    Failed {
        candidate_id: String,
        error: String,
    },
}

/// Drafts one invitation per candidate. Only a missing job fails the whole batch.
pub async fn draft_invites(
    store: &ContextStore,
    llm: &dyn TextGenerator,
    scheduling: &SchedulingService,
    data_dir: &Path,
    job_id: &str,
    candidate_ids: &[String],
) -> Result<Vec<InviteResult>, AppError> {
    if candidate_ids.is_empty() {
        return Err(AppError::Validation("No candidates selected.".to_string()));
    }
    let job = store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let mut results = Vec::with_capacity(candidate_ids.len());
    for candidate_id in candidate_ids {
        let result = draft_invite(store, llm, scheduling, data_dir, &job, candidate_id).await;
        results.push(match result {
            Ok(drafted) => drafted,
            Err(err) => {
                warn!("Invite for {candidate_id} failed: {err}");
                InviteResult::Failed {
                    candidate_id: candidate_id.clone(),
                    error: err.user_message(),
                }
            }
        });
    }
    Ok(results)
}

async fn draft_invite(
    store: &ContextStore,
    llm: &dyn TextGenerator,
    scheduling: &SchedulingService,
    data_dir: &Path,
    job: &JobRecord,
    candidate_id: &str,
) -> Result<InviteResult, AppError> {
    let candidate = store
        .get_candidate(candidate_id)
        .await?
        .filter(|c| c.is_linked_to(&job.job_id))
        .ok_or_else(|| AppError::NotFound(format!("{candidate_id}: Not found")))?;
    let (name, email) = contact(&candidate)?;

    let link = scheduling.personalized_link(name, email).await?;

    let prompt = fill(
        INVITE_PROMPT,
        &[
            ("name", name),
            ("email", email),
            ("title", job.title.as_deref().unwrap_or("Unknown")),
            ("specialization", job.specialization.as_deref().unwrap_or("")),
            ("job_description", job.job_description.as_deref().unwrap_or("")),
            ("link", link.as_str()),
        ],
    );
    let request = CompletionRequest::new(Backend::Llama, DEFAULT_ROLE, prompt)
        .temperature(0.7)
        .max_tokens(500);
    let email_text = llm.complete(&request).await?.trim().to_string();

    let file_name = invite_file_name(name, candidate_id, Utc::now());
    write_artifact(
        data_dir,
        &job.job_id,
        ArtifactKind::Emails,
        &file_name,
        email_text.as_bytes(),
    )
    .await?;

    info!("Drafted invite {file_name} for {candidate_id}");
    Ok(InviteResult::Drafted {
        candidate_id: candidate_id.to_string(),
        name: name.to_string(),
        link,
        file_name,
        email_text,
    })
}

/// `<name>_<YYYYmmdd_HHMMSS>_<candidate id>.txt`. The id keeps same-name
/// candidates drafted in the same second apart.
fn invite_file_name(name: &str, candidate_id: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}.txt",
        file_stem(name),
        at.format("%Y%m%d_%H%M%S"),
        file_stem(candidate_id)
    )
}

fn contact(candidate: &CandidateRecord) -> Result<(&str, &str), AppError> {
    let name = candidate.name.as_deref().filter(|s| !s.trim().is_empty());
    let email = candidate.email.as_deref().filter(|s| !s.trim().is_empty());
    match (name, email) {
        (Some(name), Some(email)) => Ok((name, email)),
        _ => Err(AppError::Validation(format!(
            "{}: name and email are required; evaluate the candidate first",
            candidate.candidate_id
        ))),
    }
}

/// Saved invitation file names for the job, sorted.
pub async fn list_emails(data_dir: &Path, job_id: &str) -> Result<Vec<String>, AppError> {
    let dir = artifact_dir(data_dir, job_id, ArtifactKind::Emails)?;
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_failure(&dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_failure(&dir, e))? {
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(".txt") {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

pub async fn read_email(data_dir: &Path, job_id: &str, file_name: &str) -> Result<String, AppError> {
    let path = artifact_path(data_dir, job_id, ArtifactKind::Emails, file_name)?;
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| io_failure(&path, e))
}

/// Overwrites an existing invitation with edited text.
pub async fn save_email(
    data_dir: &Path,
    job_id: &str,
    file_name: &str,
    text: &str,
) -> Result<(), AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Email text cannot be empty".to_string()));
    }
    read_email(data_dir, job_id, file_name).await?;
    write_artifact(data_dir, job_id, ArtifactKind::Emails, file_name, text.as_bytes()).await?;
    info!("Overwrote invite {file_name} for job {job_id}");
    Ok(())
}

/// Rewrites a saved invitation according to `instruction` and overwrites the file.
pub async fn revise_email(
    llm: &dyn TextGenerator,
    data_dir: &Path,
    job_id: &str,
    file_name: &str,
    instruction: &str,
) -> Result<String, AppError> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(AppError::Validation("Instruction cannot be empty".to_string()));
    }
    let original = read_email(data_dir, job_id, file_name).await?;

    let prompt = fill(
        REVISE_PROMPT,
        &[("email", original.as_str()), ("instruction", instruction)],
    );
    let request = CompletionRequest::new(Backend::Llama, DEFAULT_ROLE, prompt)
        .temperature(0.6)
        .max_tokens(600);
    let revised = llm.complete(&request).await?.trim().to_string();

    write_artifact(data_dir, job_id, ArtifactKind::Emails, file_name, revised.as_bytes()).await?;
    info!("Revised invite {file_name} for job {job_id}");
    Ok(revised)
}
