//! Axum route handlers for the job creation panel.

use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::context::models::JobRecord;
use crate::errors::AppError;
use crate::jobs::{create_job, draft_job_description, update_job, JobUpdate, NewJob};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job: JobRecord,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListJobsQuery {
    /// Only jobs that have at least one linked candidate.
    #[serde(default)]
    pub with_candidates: bool,
}

#[derive(Debug, Serialize)]
pub struct JobListItem {
    pub job_id: String,
    pub label: String,
    pub title: String,
    pub specialization: Option<String>,
    pub years_required: Option<u32>,
}

/// POST /api/v1/jobs/draft
pub async fn handle_draft_job(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let job_description = draft_job_description(state.llm.as_ref(), &request.prompt).await?;
    Ok(Json(DraftResponse { job_description }))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<NewJob>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    let job = create_job(&state.store, state.llm.as_ref(), request).await?;
    let message = format!("✅ Job saved: {}", job.title_or_default());
    Ok((StatusCode::CREATED, Json(CreateJobResponse { job, message })))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobListItem>>, AppError> {
    let mut jobs = state.store.list_jobs().await?;
    if query.with_candidates {
        let linked: HashSet<String> = state
            .store
            .list_candidates()
            .await?
            .into_iter()
            .filter_map(|c| c.job_id)
            .collect();
        jobs.retain(|job| linked.contains(&job.job_id));
    }

    let items = jobs
        .into_iter()
        .map(|job| JobListItem {
            label: job.label(),
            title: job.title_or_default().to_string(),
            job_id: job.job_id,
            specialization: job.specialization,
            years_required: job.years_required,
        })
        .collect();
    Ok(Json(items))
}

/// GET /api/v1/jobs/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>, AppError> {
    let job = state
        .store
        .get_job(&job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// PATCH /api/v1/jobs/:job_id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(update): Json<JobUpdate>,
) -> Result<Json<JobRecord>, AppError> {
    Ok(Json(update_job(&state.store, &job_id, update).await?))
}
