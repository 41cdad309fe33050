use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analytics::{
    available_columns, candidate_rows, correlate_for_job, explain, follow_up, Correlation,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CorrelationQuery {
    pub col1: String,
    pub col2: String,
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub job_id: String,
    pub candidates: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    #[serde(flatten)]
    pub correlation: Correlation,
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct FollowUpRequest {
    pub col1: String,
    pub col2: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct FollowUpResponse {
    #[serde(flatten)]
    pub correlation: Correlation,
    pub answer: String,
}

/// GET /api/v1/jobs/:job_id/columns
pub async fn handle_list_columns(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ColumnsResponse>, AppError> {
    let rows = candidate_rows(&state.store, &job_id).await?;
    Ok(Json(ColumnsResponse {
        candidates: rows.len(),
        columns: available_columns(&rows),
        job_id,
    }))
}

/// GET /api/v1/jobs/:job_id/correlation?col1=&col2=
pub async fn handle_correlation(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<CorrelationQuery>,
) -> Result<Json<CorrelationResponse>, AppError> {
    let (_, correlation) = correlate_for_job(&state.store, &job_id, &query.col1, &query.col2).await?;
    let explanation = explain(state.llm.as_ref(), &correlation).await;
    Ok(Json(CorrelationResponse {
        correlation,
        explanation,
    }))
}

/// POST /api/v1/jobs/:job_id/correlation/chat
pub async fn handle_follow_up(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<FollowUpRequest>,
) -> Result<Json<FollowUpResponse>, AppError> {
    let (rows, correlation) =
        correlate_for_job(&state.store, &job_id, &request.col1, &request.col2).await?;
    let answer = follow_up(state.llm.as_ref(), &rows, &correlation, &request.question).await?;
    Ok(Json(FollowUpResponse {
        correlation,
        answer,
    }))
}
