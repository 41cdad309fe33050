//! Axum route handlers for the candidate panels.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::artifacts::check_segment;
use crate::context::models::CandidateRecord;
use crate::errors::AppError;
use crate::evaluation::notes::{get_notes, save_notes, CandidateNotes};
use crate::evaluation::pipeline::evaluate_candidate;
use crate::evaluation::resume::register_resume;
use crate::evaluation::scoring::{AverageScore, ScoreBand};
use crate::llm_client::Backend;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub candidate_id: String,
    pub application_id: Option<String>,
    pub resume_file: Option<String>,
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CandidateListItem {
    pub candidate_id: String,
    pub label: String,
    pub evaluated: bool,
    pub avg_score: Option<AverageScore>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub job_id: String,
    #[serde(default = "default_reviewer")]
    pub reviewer: Backend,
}

fn default_reviewer() -> Backend {
    Backend::Llama
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub candidate_id: String,
    pub job_id: String,
    pub from_cache: bool,
    pub reviewer: Backend,
    pub summary: String,
    pub candidate: CandidateRecord,
}

#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub candidate_id: String,
    pub job_id: String,
    pub avg_score: Option<AverageScore>,
    pub band: ScoreBand,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub job_id: String,
    #[serde(default)]
    pub note: String,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/:job_id/resumes
///
/// Multipart upload. The first part carrying a file name is stored as the resume.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?
    {
        let Some(file_name) = field.file_name().map(String::from) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::Validation("Missing file or job ID.".to_string()))?;

    let candidate =
        register_resume(&state.store, &state.config.data_dir, &job_id, &file_name, data).await?;

    let short_job: String = job_id.chars().take(8).collect();
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: format!("✅ Resume uploaded and linked to `{short_job}`."),
            candidate_id: candidate.candidate_id,
            application_id: candidate.application_id,
            resume_file: candidate.resume_file,
            job_id,
        }),
    ))
}

/// GET /api/v1/jobs/:job_id/candidates
///
/// Candidates linked to the job that have a resume on file.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<CandidateListItem>>, AppError> {
    let items = state
        .store
        .list_candidates()
        .await?
        .into_iter()
        .filter(|c| c.is_linked_to(&job_id) && c.resume_file.is_some())
        .map(|c| CandidateListItem {
            label: c.label(),
            evaluated: c.has_evaluation_for(&job_id),
            avg_score: c.avg_score,
            candidate_id: c.candidate_id,
        })
        .collect();
    Ok(Json(items))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
) -> Result<Json<CandidateRecord>, AppError> {
    let candidate = state
        .store
        .get_candidate(&candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    Ok(Json(candidate))
}

/// POST /api/v1/candidates/:id/evaluate
///
/// Runs the evaluation pipeline, or returns the stored result for the same job.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    if request.job_id.trim().is_empty() {
        return Err(AppError::Validation(
            "Please select both resume and job ID.".to_string(),
        ));
    }

    let evaluation = evaluate_candidate(
        &state.store,
        state.llm.as_ref(),
        &state.config.data_dir,
        &candidate_id,
        &request.job_id,
    )
    .await?;

    let summary = evaluation
        .summary(request.reviewer)
        .unwrap_or("No summary available")
        .to_string();

    Ok(Json(EvaluateResponse {
        candidate_id,
        job_id: request.job_id,
        from_cache: evaluation.from_cache,
        reviewer: request.reviewer,
        summary,
        candidate: evaluation.candidate,
    }))
}

/// GET /api/v1/candidates/:id/score?job_id=
pub async fn handle_score(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Query(query): Query<JobQuery>,
) -> Result<Json<ScoreResponse>, AppError> {
    check_segment("job id", &query.job_id)?;
    let candidate = state
        .store
        .get_candidate(&candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;

    let avg_score = candidate
        .avg_score
        .filter(|_| candidate.is_linked_to(&query.job_id));
    let band = avg_score.map_or(ScoreBand::Unscored, |s| s.band());
    let message = match avg_score {
        Some(AverageScore::Score(v)) => format!("Average Score: {v}"),
        Some(AverageScore::Unavailable) => "Average Score: N/A".to_string(),
        None => "Score not available. Generate profile first.".to_string(),
    };

    Ok(Json(ScoreResponse {
        candidate_id,
        job_id: query.job_id,
        avg_score,
        band,
        message,
    }))
}

/// GET /api/v1/candidates/:id/notes?job_id=
pub async fn handle_get_notes(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Query(query): Query<JobQuery>,
) -> Result<Json<CandidateNotes>, AppError> {
    let notes = get_notes(&state.store, &candidate_id, &query.job_id).await?;
    Ok(Json(notes))
}

/// PUT /api/v1/candidates/:id/notes
pub async fn handle_save_notes(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Json(request): Json<NotesRequest>,
) -> Result<Json<CandidateNotes>, AppError> {
    let notes = save_notes(
        &state.store,
        &candidate_id,
        &request.job_id,
        &request.note,
        &request.tags,
    )
    .await?;
    Ok(Json(notes))
}
