pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::analytics::handlers as analytics;
use crate::context::handlers as context;
use crate::documents::handlers as documents;
use crate::evaluation::handlers as evaluation;
use crate::interviews::handlers as interviews;
use crate::jobs::handlers as jobs;
use crate::scheduling::handlers as scheduling;
use crate::state::AppState;

/// Upper bound for a resume upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/v1/jobs/draft", post(jobs::handle_draft_job))
        .route(
            "/api/v1/jobs/:job_id",
            get(jobs::handle_get_job).patch(jobs::handle_update_job),
        )
        // Candidates & evaluation
        .route(
            "/api/v1/jobs/:job_id/resumes",
            post(evaluation::handle_upload_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/v1/jobs/:job_id/candidates",
            get(evaluation::handle_list_candidates),
        )
        .route("/api/v1/candidates/:id", get(evaluation::handle_get_candidate))
        .route(
            "/api/v1/candidates/:id/evaluate",
            post(evaluation::handle_evaluate),
        )
        .route("/api/v1/candidates/:id/score", get(evaluation::handle_score))
        .route(
            "/api/v1/candidates/:id/notes",
            get(evaluation::handle_get_notes).put(evaluation::handle_save_notes),
        )
        // Team
        .route(
            "/api/v1/team/summary",
            get(context::handle_get_team_summary).put(context::handle_put_team_summary),
        )
        .route("/api/v1/employees", get(context::handle_list_employees))
        .route("/api/v1/employees/:id", put(context::handle_put_employee))
        // Documents
        .route(
            "/api/v1/candidates/:id/offer-letter",
            get(documents::handle_get_offer_letter).post(documents::handle_offer_letter),
        )
        .route(
            "/api/v1/candidates/:id/contract",
            post(documents::handle_contract),
        )
        // Interviews
        .route(
            "/api/v1/jobs/:job_id/interviews",
            get(interviews::handle_list_invites).post(interviews::handle_draft_invites),
        )
        .route(
            "/api/v1/jobs/:job_id/interviews/:file_name",
            get(interviews::handle_get_invite).put(interviews::handle_edit_invite),
        )
        .route(
            "/api/v1/jobs/:job_id/interviews/:file_name/revise",
            post(interviews::handle_revise_invite),
        )
        // Analytics
        .route(
            "/api/v1/jobs/:job_id/columns",
            get(analytics::handle_list_columns),
        )
        .route(
            "/api/v1/jobs/:job_id/correlation",
            get(analytics::handle_correlation),
        )
        .route(
            "/api/v1/jobs/:job_id/correlation/chat",
            post(analytics::handle_follow_up),
        )
        // Admin
        .route("/api/v1/admin/reset", post(context::handle_reset))
        .route(
            "/api/v1/admin/scheduling-link/invalidate",
            post(scheduling::handle_invalidate_link),
        )
        .with_state(state)
}
