use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents;
use crate::errors::AppError;
use crate::screening::models::{CandidateRecord, JobContext};
use crate::screening::orchestrator::AnalysisMode;
use crate::screening::pipeline::{self, ResumeDocument};
use crate::screening::ranking;
use crate::state::AppState;
use crate::storage::JobRecord;

#[derive(Serialize)]
pub struct ScreeningResponse {
    pub job_id: Uuid,
    pub processed: usize,
    /// Uploaded files that were not resumes (unsupported type or no filename).
    pub skipped: Vec<String>,
    pub analysis_mode: AnalysisMode,
    /// This batch, ranked.
    pub candidates: Vec<CandidateRecord>,
}

#[derive(Serialize)]
pub struct AnalysisModeResponse {
    pub mode: AnalysisMode,
}

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(context): Json<JobContext>,
) -> Result<(StatusCode, Json<JobRecord>), AppError> {
    if context.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if context.description.trim().is_empty() && context.requirements.trim().is_empty() {
        return Err(AppError::Validation(
            "description or requirements must be provided".to_string(),
        ));
    }
    let job = state.store.create_job(context).await?;
    info!("Job {} created: {}", job.id, job.context.title);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, AppError> {
    Ok(Json(load_job(&state, job_id).await?))
}

/// POST /api/jobs/:id/resumes
/// Multipart upload; every file part is one resume (.pdf or .txt).
pub async fn handle_upload_resumes(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningResponse>, AppError> {
    let job = load_job(&state, job_id).await?;

    let mut resumes = Vec::new();
    let mut skipped = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if documents::DocumentKind::from_filename(&filename).is_none() {
            warn!("Skipping unsupported upload {filename}");
            skipped.push(filename);
            continue;
        }
        let bytes = field.bytes().await?;

        let name = filename.clone();
        // A panic inside the PDF parser is treated like an unreadable file.
        let text = tokio::task::spawn_blocking(move || documents::extract_text(&name, &bytes))
            .await
            .unwrap_or_else(|e| {
                warn!("Text extraction for {filename} aborted: {e}");
                Some(String::new())
            })
            .unwrap_or_default();

        resumes.push(ResumeDocument {
            resume_ref: filename,
            text,
        });
    }

    screen_and_store(&state, job, resumes, skipped).await.map(Json)
}

/// POST /api/jobs/:id/resumes/text
pub async fn handle_submit_resume_text(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(documents): Json<Vec<ResumeDocument>>,
) -> Result<Json<ScreeningResponse>, AppError> {
    let job = load_job(&state, job_id).await?;
    screen_and_store(&state, job, documents, Vec::new())
        .await
        .map(Json)
}

/// GET /api/jobs/:id/candidates
/// Every candidate screened for the job, ranked.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<CandidateRecord>>, AppError> {
    let candidates = state.store.list_candidates(job_id).await?;
    Ok(Json(ranking::rank(candidates)))
}

/// GET /api/analysis/mode
pub async fn handle_analysis_mode(State(state): State<AppState>) -> Json<AnalysisModeResponse> {
    Json(AnalysisModeResponse {
        mode: state.orchestrator.mode(),
    })
}

pub(crate) async fn load_job(state: &AppState, job_id: Uuid) -> Result<JobRecord, AppError> {
    state
        .store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

async fn screen_and_store(
    state: &AppState,
    job: JobRecord,
    documents: Vec<ResumeDocument>,
    skipped: Vec<String>,
) -> Result<ScreeningResponse, AppError> {
    if documents.is_empty() {
        return Err(AppError::Validation("no resumes to screen".to_string()));
    }

    let first_sequence = state.store.next_sequence(job.id, documents.len()).await?;
    let candidates = pipeline::screen_batch(
        Arc::clone(&state.orchestrator),
        Arc::new(job.context),
        documents,
        first_sequence,
        state.config.max_concurrent_analyses,
    )
    .await;

    state.store.save_candidates(job.id, &candidates).await?;

    Ok(ScreeningResponse {
        job_id: job.id,
        processed: candidates.len(),
        skipped,
        analysis_mode: state.orchestrator.mode(),
        candidates,
    })
}
