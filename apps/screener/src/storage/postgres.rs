use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::screening::models::{AnalysisSource, CandidateRecord, JobContext};
use crate::storage::{CandidateStore, JobRecord};

/// Executed one statement at a time at startup; every statement is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS screening_jobs (
        id            UUID PRIMARY KEY,
        title         TEXT NOT NULL,
        description   TEXT NOT NULL,
        requirements  TEXT NOT NULL,
        location      TEXT NOT NULL DEFAULT '',
        department    TEXT NOT NULL DEFAULT '',
        next_sequence BIGINT NOT NULL DEFAULT 0,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS screened_candidates (
        job_id                 UUID NOT NULL REFERENCES screening_jobs(id) ON DELETE CASCADE,
        id                     UUID NOT NULL,
        sequence               BIGINT NOT NULL,
        name                   TEXT NOT NULL,
        email                  TEXT NOT NULL,
        phone                  TEXT,
        score                  DOUBLE PRECISION NOT NULL,
        summary                TEXT NOT NULL,
        skills_match           JSONB NOT NULL DEFAULT '[]',
        experience_years       INTEGER NOT NULL,
        resume_ref             TEXT NOT NULL,
        analysis_source        TEXT NOT NULL,
        created_at             TIMESTAMPTZ NOT NULL,
        interview_scheduled_at TIMESTAMPTZ,
        PRIMARY KEY (job_id, id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_screened_candidates_sequence ON screened_candidates (job_id, sequence)",
];

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        info!("Screening schema ready");
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    description: String,
    requirements: String,
    location: String,
    department: String,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        JobRecord {
            id: row.id,
            context: JobContext {
                title: row.title,
                description: row.description,
                requirements: row.requirements,
                location: row.location,
                department: row.department,
            },
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    sequence: i64,
    name: String,
    email: String,
    phone: Option<String>,
    score: f64,
    summary: String,
    skills_match: Json<Vec<String>>,
    experience_years: i32,
    resume_ref: String,
    analysis_source: String,
    created_at: DateTime<Utc>,
    interview_scheduled_at: Option<DateTime<Utc>>,
}

impl From<CandidateRow> for CandidateRecord {
    fn from(row: CandidateRow) -> Self {
        let analysis_source = AnalysisSource::parse(&row.analysis_source).unwrap_or_else(|| {
            warn!(
                "Candidate {} has unknown analysis source '{}'",
                row.id, row.analysis_source
            );
            AnalysisSource::ManualReview
        });
        CandidateRecord {
            id: row.id,
            sequence: u64::try_from(row.sequence).unwrap_or_default(),
            name: row.name,
            email: row.email,
            phone: row.phone,
            score: row.score,
            summary: row.summary,
            skills_match: row.skills_match.0,
            experience_years: u32::try_from(row.experience_years).unwrap_or_default(),
            resume_ref: row.resume_ref,
            analysis_source,
            created_at: row.created_at,
            interview_scheduled_at: row.interview_scheduled_at,
        }
    }
}

fn to_i64(value: u64, field: &str) -> Result<i64, AppError> {
    i64::try_from(value).map_err(|_| AppError::Validation(format!("{field} out of range")))
}

#[async_trait]
impl CandidateStore for PgStore {
    async fn create_job(&self, context: JobContext) -> Result<JobRecord, AppError> {
        let row: JobRow = sqlx::query_as(
            r#"
            INSERT INTO screening_jobs (id, title, description, requirements, location, department)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, requirements, location, department, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&context.title)
        .bind(&context.description)
        .bind(&context.requirements)
        .bind(&context.location)
        .bind(&context.department)
        .fetch_one(&self.pool)
        .await?;

        info!("Created job {} ({})", row.id, row.title);
        Ok(row.into())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<JobRecord>, AppError> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT id, title, description, requirements, location, department, created_at \
             FROM screening_jobs WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn next_sequence(&self, job_id: Uuid, count: usize) -> Result<u64, AppError> {
        let count = to_i64(count as u64, "batch size")?;
        // Single UPDATE so concurrent batches serialize on the job row.
        let first: Option<i64> = sqlx::query_scalar(
            "UPDATE screening_jobs SET next_sequence = next_sequence + $2 \
             WHERE id = $1 RETURNING next_sequence - $2",
        )
        .bind(job_id)
        .bind(count)
        .fetch_optional(&self.pool)
        .await?;

        let first = first.ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
        Ok(u64::try_from(first).unwrap_or_default())
    }

    async fn save_candidates(
        &self,
        job_id: Uuid,
        records: &[CandidateRecord],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO screened_candidates
                    (job_id, id, sequence, name, email, phone, score, summary, skills_match,
                     experience_years, resume_ref, analysis_source, created_at,
                     interview_scheduled_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (job_id, id) DO UPDATE SET
                    sequence = EXCLUDED.sequence,
                    name = EXCLUDED.name,
                    email = EXCLUDED.email,
                    phone = EXCLUDED.phone,
                    score = EXCLUDED.score,
                    summary = EXCLUDED.summary,
                    skills_match = EXCLUDED.skills_match,
                    experience_years = EXCLUDED.experience_years,
                    analysis_source = EXCLUDED.analysis_source,
                    created_at = EXCLUDED.created_at,
                    interview_scheduled_at = EXCLUDED.interview_scheduled_at
                "#,
            )
            .bind(job_id)
            .bind(record.id)
            .bind(to_i64(record.sequence, "sequence")?)
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.phone)
            .bind(record.score)
            .bind(&record.summary)
            .bind(Json(&record.skills_match))
            .bind(i32::try_from(record.experience_years).unwrap_or(i32::MAX))
            .bind(&record.resume_ref)
            .bind(record.analysis_source.as_str())
            .bind(record.created_at)
            .bind(record.interview_scheduled_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!("Saved {} candidates for job {job_id}", records.len());
        Ok(())
    }

    async fn list_candidates(&self, job_id: Uuid) -> Result<Vec<CandidateRecord>, AppError> {
        if self.get_job(job_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Job {job_id} not found")));
        }
        let rows: Vec<CandidateRow> = sqlx::query_as(
            r#"
            SELECT id, sequence, name, email, phone, score, summary, skills_match,
                   experience_years, resume_ref, analysis_source, created_at,
                   interview_scheduled_at
            FROM screened_candidates
            WHERE job_id = $1
            ORDER BY sequence
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_interview(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE screened_candidates SET interview_scheduled_at = $3 WHERE job_id = $1 AND id = $2",
        )
        .bind(job_id)
        .bind(candidate_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(source: &str) -> CandidateRow {
        CandidateRow {
            id: Uuid::new_v4(),
            sequence: 7,
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            score: 81.5,
            summary: "Strong fit".to_string(),
            skills_match: Json(vec!["python".to_string()]),
            experience_years: 6,
            resume_ref: "ada.pdf".to_string(),
            analysis_source: source.to_string(),
            created_at: Utc::now(),
            interview_scheduled_at: None,
        }
    }

    #[test]
    fn test_candidate_row_maps_to_record() {
        let record: CandidateRecord = row("secondary_ai").into();
        assert_eq!(record.sequence, 7);
        assert_eq!(record.experience_years, 6);
        assert_eq!(record.skills_match, vec!["python"]);
        assert_eq!(record.analysis_source, AnalysisSource::SecondaryAi);
    }

    #[test]
    fn test_unknown_source_reads_as_manual_review() {
        let record: CandidateRecord = row("mystery").into();
        assert_eq!(record.analysis_source, AnalysisSource::ManualReview);
    }

    #[test]
    fn test_schema_statements_are_idempotent() {
        assert!(SCHEMA.iter().all(|s| s.contains("IF NOT EXISTS")));
    }
}
