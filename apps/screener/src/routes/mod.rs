pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::scheduling::handlers as scheduling;
use crate::screening::handlers as screening;
use crate::state::AppState;

/// Multipart resume batches can be larger than axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs and screening
        .route("/api/jobs", post(screening::handle_create_job))
        .route("/api/jobs/:id", get(screening::handle_get_job))
        .route(
            "/api/jobs/:id/resumes",
            post(screening::handle_upload_resumes),
        )
        .route(
            "/api/jobs/:id/resumes/text",
            post(screening::handle_submit_resume_text),
        )
        .route(
            "/api/jobs/:id/candidates",
            get(screening::handle_list_candidates),
        )
        .route("/api/analysis/mode", get(screening::handle_analysis_mode))
        // Scheduling
        .route(
            "/api/jobs/:id/interviews",
            post(scheduling::handle_schedule_interviews),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
