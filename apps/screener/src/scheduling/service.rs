use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::InterviewWindow;
use crate::scheduling::allocator::{self, Assignment};
use crate::scheduling::calendar::{self, CalendarEvent, CalendarProvider};
use crate::scheduling::invitation;
use crate::scheduling::notifier::Notifier;
use crate::scheduling::slots::{self, InterviewSlot};
use crate::screening::models::CandidateRecord;
use crate::screening::orchestrator::AnalysisOrchestrator;
use crate::storage::{CandidateStore, JobRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    NotConfigured,
    /// Skipped because the calendar event could not be created.
    NotSent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduledInterview {
    pub candidate_id: Uuid,
    pub name: String,
    pub email: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub calendar_status: DeliveryStatus,
    pub event_id: Option<String>,
    pub join_link: Option<String>,
    pub email_status: DeliveryStatus,
    pub ai_drafted: bool,
    /// Whether the interview time was recorded on the candidate.
    pub persisted: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleReport {
    pub scheduled: Vec<ScheduledInterview>,
    /// Selected candidates left without a slot.
    pub unscheduled: Vec<Uuid>,
    /// Requested ids that are not candidates of the job.
    pub unknown: Vec<Uuid>,
}

pub struct InterviewScheduler {
    store: Arc<dyn CandidateStore>,
    orchestrator: Arc<AnalysisOrchestrator>,
    calendar: Option<Arc<dyn CalendarProvider>>,
    notifier: Arc<dyn Notifier>,
    window: InterviewWindow,
}

impl InterviewScheduler {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        orchestrator: Arc<AnalysisOrchestrator>,
        calendar: Option<Arc<dyn CalendarProvider>>,
        notifier: Arc<dyn Notifier>,
        window: InterviewWindow,
    ) -> Self {
        Self {
            store,
            orchestrator,
            calendar,
            notifier,
            window,
        }
    }

    /// Books interviews for the selected candidates, best-ranked first.
    ///
    /// `ranked` must already be in rank order. Calendar, notification and
    /// store failures are reported per interview and never abort the batch.
    pub async fn schedule(
        &self,
        job: &JobRecord,
        ranked: &[CandidateRecord],
        selected_ids: &[Uuid],
    ) -> ScheduleReport {
        let (selected, unknown) = select(ranked, selected_ids);
        if !unknown.is_empty() {
            warn!("Ignoring {} unknown candidate ids for job {}", unknown.len(), job.id);
        }
        if selected.is_empty() {
            return ScheduleReport {
                unknown,
                ..ScheduleReport::default()
            };
        }

        let available = self.available_slots().await;
        let plan = allocator::assign(&selected, &available);
        if plan.is_shortfall() {
            warn!(
                "Only {} of {} selected candidates could be scheduled for job {}",
                plan.assignments.len(),
                selected.len(),
                job.id
            );
        }

        let mut scheduled = Vec::with_capacity(plan.assignments.len());
        for assignment in &plan.assignments {
            let Some(candidate) = selected.iter().find(|c| c.id == assignment.candidate_id) else {
                continue;
            };
            scheduled.push(self.book(job, candidate, assignment).await);
        }

        info!(
            "Scheduled {} interviews for job {} ({} unscheduled)",
            scheduled.len(),
            job.id,
            plan.unscheduled.len()
        );

        ScheduleReport {
            scheduled,
            unscheduled: plan.unscheduled,
            unknown,
        }
    }

    /// Calendar free slots when a calendar is configured and has any,
    /// locally generated working-hour slots otherwise.
    async fn available_slots(&self) -> Vec<InterviewSlot> {
        if let Some(calendar) = &self.calendar {
            match calendar.list_free_slots(self.window.window_days).await {
                Ok(mut free) if !free.is_empty() => {
                    free.sort();
                    free.dedup();
                    free.truncate(self.window.max_slots);
                    return free;
                }
                Ok(_) => info!("{} has no free slots; generating slots", calendar.name()),
                Err(e) => warn!("{} slot lookup failed: {e:#}; generating slots", calendar.name()),
            }
        }
        slots::generate_slots(
            self.window.window_days,
            self.window.start_hour,
            self.window.end_hour,
            self.window.max_slots,
        )
    }

    async fn book(
        &self,
        job: &JobRecord,
        candidate: &CandidateRecord,
        assignment: &Assignment,
    ) -> ScheduledInterview {
        let slot = assignment.slot;
        let mut interview = ScheduledInterview {
            candidate_id: candidate.id,
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            start: slot.start,
            end: slot.end(),
            calendar_status: DeliveryStatus::NotConfigured,
            event_id: None,
            join_link: None,
            email_status: DeliveryStatus::NotSent,
            ai_drafted: false,
            persisted: false,
        };

        if let Some(calendar) = &self.calendar {
            let title = calendar::event_title(&candidate.name);
            match calendar.create_event(candidate, slot, &title).await {
                Ok(CalendarEvent { event_id, join_link }) => {
                    interview.calendar_status = DeliveryStatus::Sent;
                    interview.event_id = Some(event_id);
                    interview.join_link = join_link;
                }
                Err(e) => {
                    // No event means nothing to invite to or record.
                    warn!(
                        "{} could not create event for {}: {e:#}; not inviting",
                        calendar.name(),
                        candidate.id
                    );
                    interview.calendar_status = DeliveryStatus::Failed;
                    return interview;
                }
            }
        }

        let invitation = invitation::compose(
            &self.orchestrator,
            &job.context.title,
            candidate,
            slot,
            interview.join_link.as_deref(),
        )
        .await;
        interview.ai_drafted = invitation.ai_drafted;

        interview.email_status = if candidate.email.is_empty() {
            warn!("Candidate {} has no email address; invitation not sent", candidate.id);
            DeliveryStatus::Failed
        } else {
            match self
                .notifier
                .send(&candidate.email, &invitation.subject, &invitation.body)
                .await
            {
                Ok(()) if self.notifier.delivers() => DeliveryStatus::Sent,
                Ok(()) => DeliveryStatus::NotConfigured,
                Err(e) => {
                    warn!("Invitation to {} failed: {e:#}", candidate.email);
                    DeliveryStatus::Failed
                }
            }
        };

        interview.persisted = match self
            .store
            .mark_interview(job.id, candidate.id, slot_instant(slot.start))
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                warn!("Candidate {} vanished from job {} before booking", candidate.id, job.id);
                false
            }
            Err(e) => {
                error!("Recording interview for {} failed: {e}", candidate.id);
                false
            }
        };

        interview
    }
}

/// Selected candidates in rank order plus the ids that matched nothing.
/// Duplicate ids are collapsed.
fn select(ranked: &[CandidateRecord], selected_ids: &[Uuid]) -> (Vec<CandidateRecord>, Vec<Uuid>) {
    let wanted: HashSet<Uuid> = selected_ids.iter().copied().collect();
    let selected: Vec<CandidateRecord> = ranked
        .iter()
        .filter(|c| wanted.contains(&c.id))
        .cloned()
        .collect();

    let known: HashSet<Uuid> = ranked.iter().map(|c| c.id).collect();
    let mut seen = HashSet::new();
    let unknown = selected_ids
        .iter()
        .copied()
        .filter(|id| !known.contains(id) && seen.insert(*id))
        .collect();

    (selected, unknown)
}

/// Slots are local wall-clock times; stored timestamps are UTC.
fn slot_instant(start: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&start)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| start.and_utc())
}
