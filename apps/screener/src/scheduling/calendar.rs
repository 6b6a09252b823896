use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::scheduling::slots::InterviewSlot;
use crate::screening::models::CandidateRecord;

/// An event created on an external calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub event_id: String,
    /// Video-call link attached to the event, when the calendar issues one.
    pub join_link: Option<String>,
}

/// External calendar the scheduler books interviews on.
///
/// Implementations own their authentication. The scheduler only ever asks for
/// free slots and creates one event per assignment.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Free one-hour slots in the next `window_days` days, earliest first.
    async fn list_free_slots(&self, window_days: u32) -> Result<Vec<InterviewSlot>>;

    async fn create_event(
        &self,
        candidate: &CandidateRecord,
        slot: InterviewSlot,
        title: &str,
    ) -> Result<CalendarEvent>;
}

/// Event title shown on the calendar.
pub fn event_title(candidate_name: &str) -> String {
    format!("Interview - {candidate_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_title() {
        assert_eq!(event_title("Ada Lovelace"), "Interview - Ada Lovelace");
    }
}
