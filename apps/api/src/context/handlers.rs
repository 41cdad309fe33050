use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::artifacts::check_segment;
use crate::context::document::Collection;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_summary: String,
}

#[derive(Debug, Serialize)]
pub struct EmployeeListResponse {
    pub employees: Map<String, Value>,
}

/// GET /api/v1/team/summary
pub async fn handle_get_team_summary(
    State(state): State<AppState>,
) -> Result<Json<TeamSummary>, AppError> {
    let team_summary = state.store.get_team_summary().await?;
    Ok(Json(TeamSummary { team_summary }))
}

/// PUT /api/v1/team/summary
pub async fn handle_put_team_summary(
    State(state): State<AppState>,
    Json(req): Json<TeamSummary>,
) -> Result<Json<TeamSummary>, AppError> {
    let text = req.team_summary.trim().to_string();
    state.store.set_team_summary(text.clone()).await?;
    Ok(Json(TeamSummary { team_summary: text }))
}

/// GET /api/v1/employees
pub async fn handle_list_employees(
    State(state): State<AppState>,
) -> Result<Json<EmployeeListResponse>, AppError> {
    let employees = state.store.get_all_entities(Collection::Employees).await?;
    Ok(Json(EmployeeListResponse { employees }))
}

/// PUT /api/v1/employees/:id
///
/// Replaces the whole profile. Profiles are free-form JSON objects.
pub async fn handle_put_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<Value>,
) -> Result<Json<Value>, AppError> {
    check_segment("employee id", &id)?;
    if !profile.is_object() {
        return Err(AppError::Validation(
            "Employee profile must be a JSON object.".to_string(),
        ));
    }
    state
        .store
        .put_entity(Collection::Employees, id.as_str(), profile.clone())
        .await?;
    info!("Employee profile {id} saved");
    Ok(Json(profile))
}

/// POST /api/v1/admin/reset
pub async fn handle_reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.clear_all().await?;
    info!("Context store cleared");
    Ok(StatusCode::NO_CONTENT)
}
