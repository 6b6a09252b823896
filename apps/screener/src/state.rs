use std::sync::Arc;

use crate::config::Config;
use crate::scheduling::InterviewScheduler;
use crate::screening::orchestrator::AnalysisOrchestrator;
use crate::storage::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Postgres when DATABASE_URL is set, in-memory otherwise.
    pub store: Arc<dyn CandidateStore>,
    /// Owns the process-wide analysis mode.
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub scheduler: Arc<InterviewScheduler>,
}
