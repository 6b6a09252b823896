//! Interview invitation text. The body is drafted by the current AI provider
//! when there is one; the template below is used otherwise.

use serde::Serialize;

use crate::llm_client::fill_template;
use crate::scheduling::prompts::{INVITATION_PROMPT_TEMPLATE, INVITATION_SYSTEM};
use crate::scheduling::slots::{InterviewSlot, INTERVIEW_DURATION_MINUTES};
use crate::screening::models::CandidateRecord;
use crate::screening::orchestrator::AnalysisOrchestrator;

const DEFAULT_LOCATION: &str = "Video call";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invitation {
    pub subject: String,
    pub body: String,
    pub ai_drafted: bool,
}

pub fn subject_line(job_title: &str) -> String {
    let title = job_title.trim();
    if title.is_empty() {
        "Interview Invitation - Position".to_string()
    } else {
        format!("Interview Invitation - {title}")
    }
}

pub async fn compose(
    orchestrator: &AnalysisOrchestrator,
    job_title: &str,
    candidate: &CandidateRecord,
    slot: InterviewSlot,
    join_link: Option<&str>,
) -> Invitation {
    let subject = subject_line(job_title);
    let details = SlotDetails::new(slot, join_link);

    let prompt = fill_template(
        INVITATION_PROMPT_TEMPLATE,
        &[
            ("candidate_name", candidate.name.as_str()),
            ("job_title", job_title),
            ("date", details.date.as_str()),
            ("time", details.time.as_str()),
            ("duration", details.duration.as_str()),
            ("location", details.location.as_str()),
            ("summary", candidate.summary.as_str()),
        ],
    );

    match orchestrator.draft_text(&prompt, INVITATION_SYSTEM).await {
        Some(body) => Invitation {
            subject,
            body,
            ai_drafted: true,
        },
        None => Invitation {
            subject,
            body: template_body(&candidate.name, job_title, &details),
            ai_drafted: false,
        },
    }
}

struct SlotDetails {
    date: String,
    time: String,
    duration: String,
    location: String,
}

impl SlotDetails {
    fn new(slot: InterviewSlot, join_link: Option<&str>) -> Self {
        Self {
            date: slot.start.format("%Y-%m-%d").to_string(),
            time: slot.start.format("%H:%M").to_string(),
            duration: format!("{INTERVIEW_DURATION_MINUTES} minutes"),
            location: join_link.unwrap_or(DEFAULT_LOCATION).to_string(),
        }
    }
}

fn template_body(candidate_name: &str, job_title: &str, details: &SlotDetails) -> String {
    let position = if job_title.trim().is_empty() {
        "the open position".to_string()
    } else {
        format!("the {} position", job_title.trim())
    };
    format!(
        "Dear {candidate_name},\n\n\
         We are pleased to invite you to interview for {position}.\n\n\
         Date: {date}\n\
         Time: {time}\n\
         Duration: {duration}\n\
         Location: {location}\n\n\
         Please reply to this email if you need to reschedule.\n\n\
         Best regards,\n\
         HR Team",
        date = details.date,
        time = details.time,
        duration = details.duration,
        location = details.location,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{CompletionProvider, LlmError};
    use crate::screening::models::{AnalysisSource, Assessment, ContactFields, ResumeSubject};
    use crate::screening::orchestrator::{AnalysisMode, ProviderState};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn candidate() -> CandidateRecord {
        let subject = ResumeSubject::new(
            0,
            "ada.pdf".to_string(),
            ContactFields {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: String::new(),
                experience_years: 5,
            },
            "resume text",
        );
        CandidateRecord::from_assessment(
            &subject,
            Assessment {
                score: 88.0,
                summary: "Strong analytical background".to_string(),
                skills_match: vec![],
                experience_years: 5,
            },
            AnalysisSource::PrimaryAi,
        )
    }

    fn slot() -> InterviewSlot {
        InterviewSlot::new(
            NaiveDate::from_ymd_opt(2025, 3, 4)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        )
    }

    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok(format!("DRAFT\n{prompt}"))
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl CompletionProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    fn with_primary(provider: Arc<dyn CompletionProvider>) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(
            Some(provider),
            None,
            Arc::new(ProviderState::new(AnalysisMode::PrimaryAi)),
            4000,
        )
    }

    #[tokio::test]
    async fn test_template_when_rule_based() {
        let orchestrator = AnalysisOrchestrator::rule_based_only();
        let invitation = compose(&orchestrator, "Data Engineer", &candidate(), slot(), None).await;

        assert!(!invitation.ai_drafted);
        assert_eq!(invitation.subject, "Interview Invitation - Data Engineer");
        assert!(invitation.body.starts_with("Dear Ada Lovelace,"));
        assert!(invitation.body.contains("Date: 2025-03-04"));
        assert!(invitation.body.contains("Time: 10:00"));
        assert!(invitation.body.contains("Location: Video call"));
    }

    #[tokio::test]
    async fn test_ai_draft_carries_slot_details() {
        let orchestrator = with_primary(Arc::new(EchoProvider));
        let invitation = compose(
            &orchestrator,
            "Data Engineer",
            &candidate(),
            slot(),
            Some("https://meet.example.com/abc"),
        )
        .await;

        assert!(invitation.ai_drafted);
        assert!(invitation.body.starts_with("DRAFT"));
        assert!(invitation.body.contains("2025-03-04"));
        assert!(invitation.body.contains("https://meet.example.com/abc"));
        assert!(invitation.body.contains("Strong analytical background"));
    }

    #[tokio::test]
    async fn test_provider_failure_uses_template() {
        let orchestrator = with_primary(Arc::new(BrokenProvider));
        let invitation = compose(&orchestrator, "", &candidate(), slot(), None).await;

        assert!(!invitation.ai_drafted);
        assert_eq!(invitation.subject, "Interview Invitation - Position");
        assert!(invitation.body.contains("the open position"));
        // A transient failure does not change the analysis mode.
        assert_eq!(orchestrator.mode(), AnalysisMode::PrimaryAi);
    }
}
