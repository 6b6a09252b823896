use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::models::{CandidateRecord, JobContext};
use crate::storage::{CandidateStore, JobRecord};

struct JobEntry {
    job: JobRecord,
    next_sequence: u64,
    candidates: Vec<CandidateRecord>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<Uuid, JobEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn job_not_found(job_id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {job_id} not found"))
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn create_job(&self, context: JobContext) -> Result<JobRecord, AppError> {
        let job = JobRecord {
            id: Uuid::new_v4(),
            context,
            created_at: Utc::now(),
        };
        self.jobs.write().await.insert(
            job.id,
            JobEntry {
                job: job.clone(),
                next_sequence: 0,
                candidates: Vec::new(),
            },
        );
        Ok(job)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, AppError> {
        Ok(self.jobs.read().await.get(&job_id).map(|e| e.job.clone()))
    }

    async fn next_sequence(&self, job_id: Uuid, count: usize) -> Result<u64, AppError> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs.get_mut(&job_id).ok_or_else(|| job_not_found(job_id))?;
        let first = entry.next_sequence;
        entry.next_sequence += count as u64;
        Ok(first)
    }

    async fn save_candidates(
        &self,
        job_id: Uuid,
        records: &[CandidateRecord],
    ) -> Result<(), AppError> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs.get_mut(&job_id).ok_or_else(|| job_not_found(job_id))?;
        for record in records {
            match entry.candidates.iter_mut().find(|c| c.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => entry.candidates.push(record.clone()),
            }
        }
        entry.candidates.sort_by_key(|c| c.sequence);
        Ok(())
    }

    async fn list_candidates(&self, job_id: Uuid) -> Result<Vec<CandidateRecord>, AppError> {
        let jobs = self.jobs.read().await;
        let entry = jobs.get(&job_id).ok_or_else(|| job_not_found(job_id))?;
        Ok(entry.candidates.clone())
    }

    async fn mark_interview(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(&job_id) else {
            return Ok(false);
        };
        match entry.candidates.iter_mut().find(|c| c.id == candidate_id) {
            Some(candidate) => {
                candidate.interview_scheduled_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
