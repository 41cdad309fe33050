//! Axum route handlers for the document creation panel.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::documents::{generate_contract, generate_offer_letter, DocumentOverrides, GeneratedDocument};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub job_id: String,
    #[serde(flatten)]
    pub overrides: DocumentOverrides,
}

#[derive(Debug, Serialize)]
pub struct StoredOfferResponse {
    pub candidate_id: String,
    pub offer_letter: String,
}

/// POST /api/v1/candidates/:id/offer-letter
pub async fn handle_offer_letter(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let doc = generate_offer_letter(
        &state.store,
        state.llm.as_ref(),
        &state.config.data_dir,
        &candidate_id,
        &request.job_id,
        &request.overrides,
    )
    .await?;
    Ok(Json(doc))
}

/// GET /api/v1/candidates/:id/offer-letter
///
/// The last offer letter stored on the candidate; empty when none was drafted.
pub async fn handle_get_offer_letter(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
) -> Result<Json<StoredOfferResponse>, AppError> {
    let offer_letter = state.store.get_candidate_offer(&candidate_id).await?;
    Ok(Json(StoredOfferResponse {
        candidate_id,
        offer_letter,
    }))
}

/// POST /api/v1/candidates/:id/contract
pub async fn handle_contract(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<GeneratedDocument>, AppError> {
    let doc = generate_contract(
        &state.store,
        state.llm.as_ref(),
        &state.config.data_dir,
        &candidate_id,
        &request.job_id,
        &request.overrides,
    )
    .await?;
    Ok(Json(doc))
}
