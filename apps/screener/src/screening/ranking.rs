use std::cmp::Ordering;

use crate::screening::models::CandidateRecord;

/// Orders candidates by score, highest first. Equal scores keep submission
/// order: records are first put in sequence order, then stably sorted.
pub fn rank(mut records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    records.sort_by_key(|r| r.sequence);
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    records
}
