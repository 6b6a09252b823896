//! Batch screening: extract → analyze (bounded concurrency) → rank.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::screening::extractor;
use crate::screening::models::{self, CandidateRecord, JobContext, ResumeSubject};
use crate::screening::orchestrator::AnalysisOrchestrator;
use crate::screening::ranking;

/// Raw resume text plus a reference to where it came from.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeDocument {
    #[serde(rename = "source")]
    pub resume_ref: String,
    pub text: String,
}

/// Analyses every document and returns the ranked batch.
///
/// Each document gets the sequence number `first_sequence + index` before any
/// work starts, so ranking ties resolve by submission order however the tasks
/// complete. The output always has one record per input document, each with a
/// distinct id: a document repeated within the batch is keyed by its sequence.
pub async fn screen_batch(
    orchestrator: Arc<AnalysisOrchestrator>,
    job: Arc<JobContext>,
    documents: Vec<ResumeDocument>,
    first_sequence: u64,
    max_concurrency: usize,
) -> Vec<CandidateRecord> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut pending = Vec::with_capacity(documents.len());
    let mut taken = HashSet::with_capacity(documents.len());

    for (index, document) in documents.into_iter().enumerate() {
        let mut subject = ResumeSubject::new(
            first_sequence + index as u64,
            document.resume_ref.clone(),
            extractor::extract(&document.text),
            &document.text,
        );
        if !taken.insert(subject.id) {
            subject.id = models::sequenced_id(subject.id, subject.sequence);
            taken.insert(subject.id);
        }

        let task_subject = subject.clone();
        let orchestrator = Arc::clone(&orchestrator);
        let job = Arc::clone(&job);
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            orchestrator
                .analyze(&document.text, &job, &task_subject)
                .await
        });
        pending.push((subject, handle));
    }

    let mut records = Vec::with_capacity(pending.len());
    for (subject, handle) in pending {
        match handle.await {
            Ok(record) => records.push(record),
            Err(e) => {
                error!("Analysis task for {} aborted: {e}", subject.resume_ref);
                records.push(CandidateRecord::manual_review(&subject));
            }
        }
    }

    let mut by_source: HashMap<&'static str, usize> = HashMap::new();
    for record in &records {
        *by_source.entry(record.analysis_source.as_str()).or_default() += 1;
    }
    info!(
        "Screened {} resumes for '{}' (mode now {:?}): {:?}",
        records.len(),
        job.title,
        orchestrator.mode(),
        by_source
    );

    ranking::rank(records)
}
