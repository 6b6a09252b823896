use serde::Serialize;
use uuid::Uuid;

use crate::scheduling::slots::InterviewSlot;
use crate::screening::models::CandidateRecord;

/// A candidate paired with an interview slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub candidate_id: Uuid,
    pub slot: InterviewSlot,
}

/// Result of slot allocation. Candidates that did not get a slot are listed
/// explicitly so callers can tell them apart from candidates never selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllocationPlan {
    pub assignments: Vec<Assignment>,
    pub unscheduled: Vec<Uuid>,
}

impl AllocationPlan {
    pub fn is_shortfall(&self) -> bool {
        !self.unscheduled.is_empty()
    }
}

/// Greedy pairing: the i-th ranked candidate gets the i-th slot.
pub fn assign(ranked: &[CandidateRecord], slots: &[InterviewSlot]) -> AllocationPlan {
    let assignments = ranked
        .iter()
        .zip(slots)
        .map(|(candidate, slot)| Assignment {
            candidate_id: candidate.id,
            slot: *slot,
        })
        .collect::<Vec<_>>();

    let unscheduled = ranked
        .iter()
        .skip(assignments.len())
        .map(|candidate| candidate.id)
        .collect();

    AllocationPlan {
        assignments,
        unscheduled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::slots::generate_slots_from;
    use crate::screening::models::{AnalysisSource, Assessment, ContactFields, ResumeSubject};
    use chrono::NaiveDate;

    fn candidates(count: u64) -> Vec<CandidateRecord> {
        (0..count)
            .map(|i| {
                let subject = ResumeSubject::new(
                    i,
                    format!("c{i}.pdf"),
                    ContactFields {
                        name: format!("Candidate {i}"),
                        email: format!("c{i}@example.com"),
                        phone: String::new(),
                        experience_years: 1,
                    },
                    "resume text",
                );
                CandidateRecord::from_assessment(
                    &subject,
                    Assessment {
                        score: 90.0 - i as f64,
                        summary: String::new(),
                        skills_match: vec![],
                        experience_years: 1,
                    },
                    AnalysisSource::RuleBased,
                )
            })
            .collect()
    }

    fn slots(count: usize) -> Vec<InterviewSlot> {
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        generate_slots_from(sunday, 7, 9, 17, count)
    }

    #[test]
    fn test_shortfall_reports_unscheduled() {
        let ranked = candidates(5);
        let available = slots(3);
        let plan = assign(&ranked, &available);

        assert_eq!(plan.assignments.len(), 3);
        for (i, assignment) in plan.assignments.iter().enumerate() {
            assert_eq!(assignment.candidate_id, ranked[i].id);
            assert_eq!(assignment.slot, available[i]);
        }
        assert_eq!(plan.unscheduled, vec![ranked[3].id, ranked[4].id]);
        assert!(plan.is_shortfall());
    }

    #[test]
    fn test_more_slots_than_candidates() {
        let plan = assign(&candidates(2), &slots(8));
        assert_eq!(plan.assignments.len(), 2);
        assert!(plan.unscheduled.is_empty());
        assert!(!plan.is_shortfall());
    }

    #[test]
    fn test_no_slots_leaves_everyone_unscheduled() {
        let ranked = candidates(2);
        let plan = assign(&ranked, &[]);
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.unscheduled.len(), 2);
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(assign(&[], &slots(3)), AllocationPlan::default());
    }
}
