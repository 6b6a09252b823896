//! Persistence for job contexts and screened candidates.
//!
//! Handlers and the scheduler only see `CandidateStore`; `main` picks the
//! Postgres store when `DATABASE_URL` is set and the in-memory store otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::models::{CandidateRecord, JobContext};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored job context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub context: JobContext,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn create_job(&self, context: JobContext) -> Result<JobRecord, AppError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, AppError>;

    /// Reserves `count` consecutive sequence numbers for a batch and returns
    /// the first. Concurrent batches for one job never overlap.
    async fn next_sequence(&self, job_id: Uuid, count: usize) -> Result<u64, AppError>;

    /// Inserts the records, replacing any with the same candidate id.
    async fn save_candidates(
        &self,
        job_id: Uuid,
        records: &[CandidateRecord],
    ) -> Result<(), AppError>;

    /// All candidates of the job in submission (sequence) order.
    async fn list_candidates(&self, job_id: Uuid) -> Result<Vec<CandidateRecord>, AppError>;

    /// Returns false when the candidate does not exist for this job.
    async fn mark_interview(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
}
