//! Analysis Orchestrator: picks the analysis strategy for each resume and owns
//! the process-wide provider degradation state.
//!
//! Modes are tried in priority order PrimaryAi → SecondaryAi → RuleBased. A
//! quota or auth failure moves the shared mode down one tier for the rest of the
//! process and retries the triggering resume once; any other failure falls back
//! to rule-based scoring for that resume only. `analyze` never fails.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::llm_client::{fill_template, CompletionProvider, FailureCategory, LlmError};
use crate::screening::models::{
    AnalysisOutcome, AnalysisSource, CandidateRecord, ContactFields, JobContext, ResumeSubject,
};
use crate::screening::prompts::{ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM};
use crate::screening::{response_parser, rule_scorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AnalysisMode {
    PrimaryAi = 0,
    SecondaryAi = 1,
    RuleBased = 2,
}

impl AnalysisMode {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => AnalysisMode::PrimaryAi,
            1 => AnalysisMode::SecondaryAi,
            _ => AnalysisMode::RuleBased,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider state
// ────────────────────────────────────────────────────────────────────────────

/// The current analysis mode. Only ever moves down; transitions are a single
/// compare-and-swap so concurrent failures cannot apply the same downgrade twice.
#[derive(Debug)]
pub struct ProviderState {
    mode: AtomicU8,
}

impl ProviderState {
    pub fn new(initial: AnalysisMode) -> Self {
        Self {
            mode: AtomicU8::new(initial as u8),
        }
    }

    pub fn current(&self) -> AnalysisMode {
        AnalysisMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Moves `from` → `to` if the mode is still `from` and `to` is a lower tier.
    /// Returns true only for the caller that applied the transition.
    pub fn downgrade(&self, from: AnalysisMode, to: AnalysisMode) -> bool {
        if to <= from {
            return false;
        }
        self.mode
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct AnalysisOrchestrator {
    primary: Option<Arc<dyn CompletionProvider>>,
    secondary: Option<Arc<dyn CompletionProvider>>,
    state: Arc<ProviderState>,
    excerpt_chars: usize,
}

impl AnalysisOrchestrator {
    pub fn new(
        primary: Option<Arc<dyn CompletionProvider>>,
        secondary: Option<Arc<dyn CompletionProvider>>,
        state: Arc<ProviderState>,
        excerpt_chars: usize,
    ) -> Self {
        info!(
            "Analysis orchestrator ready: mode={:?}, primary={}, secondary={}",
            state.current(),
            primary.as_ref().map(|p| p.name()).unwrap_or("none"),
            secondary.as_ref().map(|p| p.name()).unwrap_or("none"),
        );
        Self {
            primary,
            secondary,
            state,
            excerpt_chars,
        }
    }

    /// Orchestrator with no AI providers; every resume is rule-based.
    pub fn rule_based_only() -> Self {
        Self::new(
            None,
            None,
            Arc::new(ProviderState::new(AnalysisMode::RuleBased)),
            0,
        )
    }

    pub fn mode(&self) -> AnalysisMode {
        self.state.current()
    }

    /// Produces exactly one candidate record for the resume.
    pub async fn analyze(
        &self,
        resume_text: &str,
        job: &JobContext,
        subject: &ResumeSubject,
    ) -> CandidateRecord {
        if resume_text.trim().is_empty() {
            warn!("Resume {} has no extractable text", subject.resume_ref);
            return finalize(
                subject,
                AnalysisOutcome::Failed("resume text is empty".to_string()),
                AnalysisSource::ManualReview,
            );
        }

        let job_text = job.evaluation_text();
        let mut retried = false;

        loop {
            let mode = self.state.current();
            let (provider, source) = match self.provider_for(mode) {
                Some(found) => found,
                None if mode == AnalysisMode::RuleBased => {
                    return self.rule_based(resume_text, &job_text, subject, AnalysisSource::RuleBased);
                }
                None => {
                    // Mode points at a tier with no configured provider.
                    self.state.downgrade(mode, self.next_tier(mode));
                    continue;
                }
            };

            let prompt = build_analysis_prompt(
                &job_text,
                resume_text,
                &subject.contact,
                self.excerpt_chars,
            );

            match provider.complete(&prompt, ANALYSIS_SYSTEM).await {
                Ok(raw) => match response_parser::parse(&raw) {
                    AnalysisOutcome::Scored(assessment) => {
                        debug!(
                            "{} scored {} at {:.1}",
                            provider.name(),
                            subject.resume_ref,
                            assessment.score
                        );
                        return finalize(subject, AnalysisOutcome::Scored(assessment), source);
                    }
                    AnalysisOutcome::Failed(reason) => {
                        warn!(
                            "{} returned malformed output for {}: {reason}; using rule-based scoring",
                            provider.name(),
                            subject.resume_ref
                        );
                        return self.rule_based(
                            resume_text,
                            &job_text,
                            subject,
                            AnalysisSource::RuleBasedFallback,
                        );
                    }
                },
                Err(err) => {
                    let category = provider.classify(&err);
                    if category.is_systemic()
                        && self.downgrade(mode, provider.name(), category, &err)
                        && !retried
                    {
                        retried = true;
                        continue;
                    }
                    warn!(
                        "{} analysis failed for {}: {err}; using rule-based scoring for this resume",
                        provider.name(),
                        subject.resume_ref
                    );
                    return self.rule_based(
                        resume_text,
                        &job_text,
                        subject,
                        AnalysisSource::RuleBasedFallback,
                    );
                }
            }
        }
    }

    /// Free-form completion through whichever AI tier is current. `None` when
    /// the process is rule-based or the call fails; systemic failures still
    /// downgrade the shared mode.
    pub async fn draft_text(&self, prompt: &str, system: &str) -> Option<String> {
        let mode = self.state.current();
        let (provider, _) = self.provider_for(mode)?;
        match provider.complete(prompt, system).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(err) => {
                let category = provider.classify(&err);
                if category.is_systemic() {
                    self.downgrade(mode, provider.name(), category, &err);
                }
                warn!("{} drafting failed: {err}", provider.name());
                None
            }
        }
    }

    fn provider_for(
        &self,
        mode: AnalysisMode,
    ) -> Option<(&Arc<dyn CompletionProvider>, AnalysisSource)> {
        match mode {
            AnalysisMode::PrimaryAi => self
                .primary
                .as_ref()
                .map(|p| (p, AnalysisSource::PrimaryAi)),
            AnalysisMode::SecondaryAi => self
                .secondary
                .as_ref()
                .map(|p| (p, AnalysisSource::SecondaryAi)),
            AnalysisMode::RuleBased => None,
        }
    }

    fn next_tier(&self, mode: AnalysisMode) -> AnalysisMode {
        match mode {
            AnalysisMode::PrimaryAi if self.secondary.is_some() => AnalysisMode::SecondaryAi,
            _ => AnalysisMode::RuleBased,
        }
    }

    /// Applies the sticky downgrade. Logs once, from the caller that won the
    /// transition; returns false if another analysis already moved the mode.
    fn downgrade(
        &self,
        from: AnalysisMode,
        provider: &str,
        category: FailureCategory,
        err: &LlmError,
    ) -> bool {
        let to = self.next_tier(from);
        let applied = self.state.downgrade(from, to);
        if applied {
            warn!(
                "{provider} reported {category:?} ({err}); analysis mode downgraded {from:?} -> {to:?} for the rest of this process"
            );
        }
        applied
    }

    fn rule_based(
        &self,
        resume_text: &str,
        job_text: &str,
        subject: &ResumeSubject,
        source: AnalysisSource,
    ) -> CandidateRecord {
        let assessment = rule_scorer::score(resume_text, job_text, &subject.contact);
        finalize(subject, AnalysisOutcome::Scored(assessment), source)
    }
}

/// Turns an outcome into a record; failures become the manual-review default.
fn finalize(
    subject: &ResumeSubject,
    outcome: AnalysisOutcome,
    source: AnalysisSource,
) -> CandidateRecord {
    match outcome {
        AnalysisOutcome::Scored(assessment) => {
            CandidateRecord::from_assessment(subject, assessment, source)
        }
        AnalysisOutcome::Failed(reason) => {
            debug!("Analysis failed for {}: {reason}", subject.resume_ref);
            CandidateRecord::manual_review(subject)
        }
    }
}

/// Builds the analysis prompt with a bounded resume excerpt.
pub fn build_analysis_prompt(
    job_text: &str,
    resume_text: &str,
    contact: &ContactFields,
    excerpt_chars: usize,
) -> String {
    let excerpt: String = resume_text.chars().take(excerpt_chars).collect();
    let phone = if contact.phone.is_empty() {
        "Not provided"
    } else {
        contact.phone.as_str()
    };
    let email = if contact.email.is_empty() {
        "Not provided"
    } else {
        contact.email.as_str()
    };

    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("job_text", job_text),
            ("contact_name", contact.name.as_str()),
            ("contact_email", email),
            ("contact_phone", phone),
            ("resume_excerpt", excerpt.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::models::MANUAL_REVIEW_SUMMARY;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    const GOOD_JSON: &str =
        r#"{"score": 77, "summary": "AI fit", "skills_match": ["python"], "experience_years": 5}"#;

    fn quota_error() -> LlmError {
        LlmError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        }
    }

    fn transient_error() -> LlmError {
        LlmError::Api {
            status: 500,
            message: "upstream hiccup".to_string(),
        }
    }

    /// Returns queued responses first, then `when_empty` forever.
    struct ScriptedProvider {
        name: &'static str,
        queue: Mutex<VecDeque<Result<String, LlmError>>>,
        when_empty: fn() -> Result<String, LlmError>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(
            name: &'static str,
            queue: Vec<Result<String, LlmError>>,
            when_empty: fn() -> Result<String, LlmError>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                queue: Mutex::new(queue.into()),
                when_empty,
                calls: AtomicUsize::new(0),
            })
        }

        fn succeeding(name: &'static str) -> Arc<Self> {
            Self::new(name, vec![], || Ok(GOOD_JSON.to_string()))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.queue.lock().unwrap().pop_front();
            next.unwrap_or_else(self.when_empty)
        }
    }

    fn orchestrator(
        primary: Option<Arc<ScriptedProvider>>,
        secondary: Option<Arc<ScriptedProvider>>,
    ) -> AnalysisOrchestrator {
        let initial = if primary.is_some() {
            AnalysisMode::PrimaryAi
        } else if secondary.is_some() {
            AnalysisMode::SecondaryAi
        } else {
            AnalysisMode::RuleBased
        };
        AnalysisOrchestrator::new(
            primary.map(|p| p as Arc<dyn CompletionProvider>),
            secondary.map(|p| p as Arc<dyn CompletionProvider>),
            Arc::new(ProviderState::new(initial)),
            4000,
        )
    }

    fn job() -> JobContext {
        JobContext {
            title: "Backend Engineer".to_string(),
            description: "Build services in Python on AWS".to_string(),
            requirements: "Python, SQL".to_string(),
            location: "Remote".to_string(),
            department: "Engineering".to_string(),
        }
    }

    fn subject(sequence: u64) -> ResumeSubject {
        ResumeSubject::new(
            sequence,
            format!("resume-{sequence}.pdf"),
            ContactFields {
                name: "Sam Lee".to_string(),
                email: format!("sam{sequence}@example.com"),
                phone: String::new(),
                experience_years: 3,
            },
            "resume text",
        )
    }

    const RESUME: &str = "Sam Lee\nBackend Engineer, python and sql, 3 years experience";

    #[test]
    fn test_state_never_upgrades() {
        let state = ProviderState::new(AnalysisMode::SecondaryAi);
        assert!(!state.downgrade(AnalysisMode::SecondaryAi, AnalysisMode::PrimaryAi));
        assert!(!state.downgrade(AnalysisMode::SecondaryAi, AnalysisMode::SecondaryAi));
        assert_eq!(state.current(), AnalysisMode::SecondaryAi);
    }

    #[test]
    fn test_state_downgrade_requires_expected_mode() {
        let state = ProviderState::new(AnalysisMode::SecondaryAi);
        assert!(!state.downgrade(AnalysisMode::PrimaryAi, AnalysisMode::RuleBased));
        assert_eq!(state.current(), AnalysisMode::SecondaryAi);
    }

    #[test]
    fn test_concurrent_downgrade_applies_once() {
        let state = Arc::new(ProviderState::new(AnalysisMode::PrimaryAi));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    state.downgrade(AnalysisMode::PrimaryAi, AnalysisMode::SecondaryAi)
                })
            })
            .collect();
        let applied = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|applied| *applied)
            .count();
        assert_eq!(applied, 1);
        assert_eq!(state.current(), AnalysisMode::SecondaryAi);
    }

    #[tokio::test]
    async fn test_rule_based_when_no_providers() {
        let orchestrator = orchestrator(None, None);
        let record = orchestrator.analyze(RESUME, &job(), &subject(0)).await;
        assert_eq!(record.analysis_source, AnalysisSource::RuleBased);
        assert!(record.summary.starts_with(rule_scorer::SUMMARY_PREFIX));
        assert!(record.score > 0.0);
    }

    #[tokio::test]
    async fn test_primary_success() {
        let primary = ScriptedProvider::succeeding("primary");
        let orchestrator = orchestrator(Some(primary.clone()), None);
        let record = orchestrator.analyze(RESUME, &job(), &subject(0)).await;
        assert_eq!(record.analysis_source, AnalysisSource::PrimaryAi);
        assert_eq!(record.score, 77.0);
        assert_eq!(record.skills_match, vec!["python"]);
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_quota_downgrade_is_sticky_and_retries_once() {
        let primary = ScriptedProvider::new(
            "primary",
            vec![Err(quota_error())],
            || Ok(GOOD_JSON.to_string()),
        );
        let secondary = ScriptedProvider::succeeding("secondary");
        let orchestrator = orchestrator(Some(primary.clone()), Some(secondary.clone()));

        let first = orchestrator.analyze(RESUME, &job(), &subject(0)).await;
        assert_eq!(first.analysis_source, AnalysisSource::SecondaryAi);
        assert_eq!(orchestrator.mode(), AnalysisMode::SecondaryAi);

        // Primary would succeed now, but the downgrade holds.
        for seq in 1..4 {
            let record = orchestrator.analyze(RESUME, &job(), &subject(seq)).await;
            assert_eq!(record.analysis_source, AnalysisSource::SecondaryAi);
        }
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 4);
        assert_eq!(orchestrator.mode(), AnalysisMode::SecondaryAi);
    }

    #[tokio::test]
    async fn test_quota_without_secondary_goes_rule_based() {
        let primary = ScriptedProvider::new("primary", vec![Err(quota_error())], || {
            Ok(GOOD_JSON.to_string())
        });
        let orchestrator = orchestrator(Some(primary.clone()), None);

        let record = orchestrator.analyze(RESUME, &job(), &subject(0)).await;
        assert_eq!(record.analysis_source, AnalysisSource::RuleBased);
        assert_eq!(orchestrator.mode(), AnalysisMode::RuleBased);

        orchestrator.analyze(RESUME, &job(), &subject(1)).await;
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_quota_on_both_tiers_ends_rule_based() {
        let primary = ScriptedProvider::new("primary", vec![], || Err(quota_error()));
        let secondary = ScriptedProvider::new("secondary", vec![], || Err(quota_error()));
        let orchestrator = orchestrator(Some(primary.clone()), Some(secondary.clone()));

        let first = orchestrator.analyze(RESUME, &job(), &subject(0)).await;
        assert_eq!(first.analysis_source, AnalysisSource::RuleBasedFallback);
        assert_eq!(orchestrator.mode(), AnalysisMode::RuleBased);

        let second = orchestrator.analyze(RESUME, &job(), &subject(1)).await;
        assert_eq!(second.analysis_source, AnalysisSource::RuleBased);
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_error_falls_back_for_one_resume_only() {
        let primary = ScriptedProvider::new(
            "primary",
            vec![Err(transient_error())],
            || Ok(GOOD_JSON.to_string()),
        );
        let orchestrator = orchestrator(Some(primary.clone()), None);

        let first = orchestrator.analyze(RESUME, &job(), &subject(0)).await;
        assert_eq!(first.analysis_source, AnalysisSource::RuleBasedFallback);
        assert_eq!(orchestrator.mode(), AnalysisMode::PrimaryAi);

        let second = orchestrator.analyze(RESUME, &job(), &subject(1)).await;
        assert_eq!(second.analysis_source, AnalysisSource::PrimaryAi);
        assert_eq!(primary.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let primary = ScriptedProvider::new(
            "primary",
            vec![Ok("I'd rather not say.".to_string())],
            || Ok(GOOD_JSON.to_string()),
        );
        let orchestrator = orchestrator(Some(primary), None);
        let record = orchestrator.analyze(RESUME, &job(), &subject(0)).await;
        assert_eq!(record.analysis_source, AnalysisSource::RuleBasedFallback);
        assert_eq!(orchestrator.mode(), AnalysisMode::PrimaryAi);
    }

    #[tokio::test]
    async fn test_empty_resume_is_manual_review() {
        let primary = ScriptedProvider::succeeding("primary");
        let orchestrator = orchestrator(Some(primary.clone()), None);
        let record = orchestrator.analyze("   \n", &job(), &subject(0)).await;
        assert_eq!(record.score, 0.0);
        assert_eq!(record.summary, MANUAL_REVIEW_SUMMARY);
        assert_eq!(record.analysis_source, AnalysisSource::ManualReview);
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_quota_failures_downgrade_once() {
        let primary = ScriptedProvider::new("primary", vec![], || Err(quota_error()));
        let secondary = ScriptedProvider::succeeding("secondary");
        let orchestrator = Arc::new(orchestrator(Some(primary), Some(secondary)));

        let mut handles = Vec::new();
        for seq in 0..8 {
            let orchestrator = Arc::clone(&orchestrator);
            handles.push(tokio::spawn(async move {
                orchestrator.analyze(RESUME, &job(), &subject(seq)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(orchestrator.mode(), AnalysisMode::SecondaryAi);
    }

    #[tokio::test]
    async fn test_draft_text_uses_current_provider() {
        let primary = ScriptedProvider::new("primary", vec![Ok("  Dear Sam  ".to_string())], || {
            Ok(GOOD_JSON.to_string())
        });
        let orchestrator = orchestrator(Some(primary), None);
        assert_eq!(
            orchestrator.draft_text("p", "s").await.as_deref(),
            Some("Dear Sam")
        );
        assert!(AnalysisOrchestrator::rule_based_only()
            .draft_text("p", "s")
            .await
            .is_none());
    }

    #[test]
    fn test_prompt_truncates_resume_and_fills_contact() {
        let contact = ContactFields {
            name: "Sam Lee".to_string(),
            email: String::new(),
            phone: "555-123-4567".to_string(),
            experience_years: 1,
        };
        let resume = "x".repeat(50);
        let prompt = build_analysis_prompt("Job {contact_name}", &resume, &contact, 10);
        assert!(prompt.contains(&"x".repeat(10)));
        assert!(!prompt.contains(&"x".repeat(11)));
        assert!(prompt.contains("Email: Not provided"));
        assert!(prompt.contains("Phone: 555-123-4567"));
        assert!(prompt.contains("Job {contact_name}"));
        assert!(prompt.contains("Name: Sam Lee"));
    }
}
