//! Resume intake and text extraction.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifacts::{artifact_path, check_segment, io_failure, write_artifact, ArtifactKind};
use crate::context::models::CandidateRecord;
use crate::context::ContextStore;
use crate::errors::AppError;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// Lowercased extension of `file_name` if it is one we can read.
pub fn resume_extension(file_name: &str) -> Result<String, AppError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::Validation(format!(
            "Unsupported resume file '{file_name}' (expected one of: {})",
            SUPPORTED_EXTENSIONS.join(", ")
        )))
    }
}

/// Stores an uploaded resume and creates the candidate linked to `job_id`.
pub async fn register_resume(
    store: &ContextStore,
    data_dir: &Path,
    job_id: &str,
    original_name: &str,
    contents: Bytes,
) -> Result<CandidateRecord, AppError> {
    check_segment("job id", job_id)?;
    if contents.is_empty() {
        return Err(AppError::Validation("Missing file or job ID.".to_string()));
    }
    store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let ext = resume_extension(original_name)?;
    let candidate_id = Uuid::new_v4().to_string();
    let file_name = format!("{candidate_id}.{ext}");
    write_artifact(data_dir, job_id, ArtifactKind::Resumes, &file_name, &contents).await?;

    let candidate = CandidateRecord {
        candidate_id: candidate_id.clone(),
        job_id: Some(job_id.to_string()),
        resume_file: Some(file_name),
        application_id: Some(Uuid::new_v4().to_string()),
        ..Default::default()
    };
    store.put_candidate(&candidate).await?;

    info!("Uploaded {original_name} as candidate {candidate_id} for job {job_id}");
    Ok(candidate)
}

/// Finds the stored resume file, looking under the candidate's own job first.
pub async fn locate_resume(
    data_dir: &Path,
    candidate: &CandidateRecord,
    requested_job_id: &str,
) -> Result<PathBuf, AppError> {
    let file_name = candidate.resume_file.as_deref().ok_or_else(|| {
        AppError::NotFound(format!(
            "Candidate {} has no resume file",
            candidate.candidate_id
        ))
    })?;

    let mut job_ids = Vec::with_capacity(2);
    if let Some(own) = candidate.job_id.as_deref() {
        job_ids.push(own);
    }
    if !job_ids.contains(&requested_job_id) {
        job_ids.push(requested_job_id);
    }

    for job_id in job_ids {
        let path = artifact_path(data_dir, job_id, ArtifactKind::Resumes, file_name)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }
    }
    Err(AppError::NotFound(format!("Resume file {file_name} not found")))
}

/// Reads resume text. PDFs are parsed on the blocking pool.
pub async fn extract_text(path: &Path) -> Result<String, AppError> {
    let data = tokio::fs::read(path).await.map_err(|e| io_failure(path, e))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = if ext == "pdf" {
        let shown = path.display().to_string();
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?
            .map_err(|e| {
                warn!("PDF extraction failed for {shown}: {e}");
                AppError::Extraction {
                    message: format!("could not read text from {shown}"),
                    raw: e.to_string(),
                }
            })?
    } else {
        String::from_utf8_lossy(&data).into_owned()
    };

    if text.trim().is_empty() {
        return Err(AppError::Extraction {
            message: format!("no text found in {}", path.display()),
            raw: String::new(),
        });
    }
    Ok(text)
}
