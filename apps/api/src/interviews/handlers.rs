//! Axum route handlers for the interview scheduler panel.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interviews::{draft_invites, list_emails, read_email, revise_email, save_email, InviteResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub candidate_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub job_id: String,
    pub results: Vec<InviteResult>,
}

#[derive(Debug, Serialize)]
pub struct EmailDocument {
    pub file_name: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditEmailRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviseEmailRequest {
    pub instruction: String,
}

/// POST /api/v1/jobs/:job_id/interviews
///
/// Drafts an invitation per selected candidate. Per-candidate failures are
/// returned inline with status 200.
pub async fn handle_draft_invites(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<InviteRequest>,
) -> Result<Json<InviteResponse>, AppError> {
    let results = draft_invites(
        &state.store,
        state.llm.as_ref(),
        &state.scheduling,
        &state.config.data_dir,
        &job_id,
        &request.candidate_ids,
    )
    .await?;
    Ok(Json(InviteResponse { job_id, results }))
}

/// GET /api/v1/jobs/:job_id/interviews
pub async fn handle_list_invites(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(list_emails(&state.config.data_dir, &job_id).await?))
}

/// GET /api/v1/jobs/:job_id/interviews/:file_name
pub async fn handle_get_invite(
    State(state): State<AppState>,
    Path((job_id, file_name)): Path<(String, String)>,
) -> Result<Json<EmailDocument>, AppError> {
    let text = read_email(&state.config.data_dir, &job_id, &file_name).await?;
    Ok(Json(EmailDocument { file_name, text }))
}

/// PUT /api/v1/jobs/:job_id/interviews/:file_name
pub async fn handle_edit_invite(
    State(state): State<AppState>,
    Path((job_id, file_name)): Path<(String, String)>,
    Json(request): Json<EditEmailRequest>,
) -> Result<StatusCode, AppError> {
    save_email(&state.config.data_dir, &job_id, &file_name, &request.text).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/:job_id/interviews/:file_name/revise
pub async fn handle_revise_invite(
    State(state): State<AppState>,
    Path((job_id, file_name)): Path<(String, String)>,
    Json(request): Json<ReviseEmailRequest>,
) -> Result<Json<EmailDocument>, AppError> {
    let text = revise_email(
        state.llm.as_ref(),
        &state.config.data_dir,
        &job_id,
        &file_name,
        &request.instruction,
    )
    .await?;
    Ok(Json(EmailDocument { file_name, text }))
}
