use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::scheduling::service::ScheduleReport;
use crate::screening::handlers::load_job;
use crate::screening::ranking;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct InterviewRequest {
    pub candidate_ids: Vec<Uuid>,
}

/// POST /api/jobs/:id/interviews
pub async fn handle_schedule_interviews(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(req): Json<InterviewRequest>,
) -> Result<Json<ScheduleReport>, AppError> {
    if req.candidate_ids.is_empty() {
        return Err(AppError::Validation(
            "candidate_ids must not be empty".to_string(),
        ));
    }
    let job = load_job(&state, job_id).await?;
    let ranked = ranking::rank(state.store.list_candidates(job_id).await?);
    let report = state
        .scheduler
        .schedule(&job, &ranked, &req.candidate_ids)
        .await;
    Ok(Json(report))
}
