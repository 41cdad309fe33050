use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InvalidateResponse {
    pub invalidated: bool,
}

/// POST /api/v1/admin/scheduling-link/invalidate
pub async fn handle_invalidate_link(State(state): State<AppState>) -> Json<InvalidateResponse> {
    Json(InvalidateResponse {
        invalidated: state.scheduling.invalidate().await,
    })
}
