use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for deterministic candidate identifiers.
const CANDIDATE_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b7e_4d0a_4c55_9a3e_8b12_7c4f_d901);

pub const MANUAL_REVIEW_SUMMARY: &str = "Analysis failed - manual review required";

/// The job a batch of resumes is evaluated against. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobContext {
    pub title: String,
    pub description: String,
    pub requirements: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub department: String,
}

impl JobContext {
    /// Text the scorer and the prompt see: title, description and requirements.
    pub fn evaluation_text(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.description, self.requirements)
    }
}

/// Fields pulled out of raw resume text by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience_years: u32,
}

/// Which path produced a candidate's score. Kept on every record for audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    PrimaryAi,
    SecondaryAi,
    RuleBased,
    /// Rule-based scoring used because the AI path failed for this resume.
    RuleBasedFallback,
    ManualReview,
}

impl AnalysisSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisSource::PrimaryAi => "primary_ai",
            AnalysisSource::SecondaryAi => "secondary_ai",
            AnalysisSource::RuleBased => "rule_based",
            AnalysisSource::RuleBasedFallback => "rule_based_fallback",
            AnalysisSource::ManualReview => "manual_review",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "primary_ai" => Some(AnalysisSource::PrimaryAi),
            "secondary_ai" => Some(AnalysisSource::SecondaryAi),
            "rule_based" => Some(AnalysisSource::RuleBased),
            "rule_based_fallback" => Some(AnalysisSource::RuleBasedFallback),
            "manual_review" => Some(AnalysisSource::ManualReview),
            _ => None,
        }
    }
}

/// A scored evaluation before contact details are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub summary: String,
    pub skills_match: Vec<String>,
    pub experience_years: u32,
}

impl Assessment {
    /// Clamps the score and drops duplicate skills, keeping first occurrences.
    pub fn normalized(mut self) -> Self {
        self.score = clamp_score(self.score);
        self.skills_match = dedup_skills(self.skills_match);
        self
    }
}

/// Result of one analysis strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Scored(Assessment),
    Failed(String),
}

/// One processed resume. Created once; only `interview_scheduled_at` changes later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub id: Uuid,
    /// Submission position within the job, used as the ranking tie-break.
    pub sequence: u64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub score: f64,
    pub summary: String,
    pub skills_match: Vec<String>,
    pub experience_years: u32,
    pub resume_ref: String,
    pub analysis_source: AnalysisSource,
    pub created_at: DateTime<Utc>,
    pub interview_scheduled_at: Option<DateTime<Utc>>,
}

/// Identity and contact details of the resume being analysed.
#[derive(Debug, Clone)]
pub struct ResumeSubject {
    pub id: Uuid,
    pub sequence: u64,
    pub resume_ref: String,
    pub contact: ContactFields,
}

impl ResumeSubject {
    pub fn new(sequence: u64, resume_ref: String, contact: ContactFields, text: &str) -> Self {
        let mut id = candidate_id(&contact.email, &resume_ref, text);
        // A blank document has nothing stable to key on.
        if text.trim().is_empty() {
            id = sequenced_id(id, sequence);
        }
        Self {
            id,
            sequence,
            resume_ref,
            contact,
        }
    }
}

impl CandidateRecord {
    pub fn from_assessment(
        subject: &ResumeSubject,
        assessment: Assessment,
        source: AnalysisSource,
    ) -> Self {
        let assessment = assessment.normalized();
        let contact = &subject.contact;
        Self {
            id: subject.id,
            sequence: subject.sequence,
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: Some(contact.phone.trim().to_string()).filter(|p| !p.is_empty()),
            score: assessment.score,
            summary: assessment.summary,
            skills_match: assessment.skills_match,
            experience_years: assessment.experience_years,
            resume_ref: subject.resume_ref.clone(),
            analysis_source: source,
            created_at: Utc::now(),
            interview_scheduled_at: None,
        }
    }

    /// Zero-score record used whenever no analysis could be produced.
    pub fn manual_review(subject: &ResumeSubject) -> Self {
        Self::from_assessment(
            subject,
            Assessment {
                score: 0.0,
                summary: MANUAL_REVIEW_SUMMARY.to_string(),
                skills_match: vec![],
                experience_years: 0,
            },
            AnalysisSource::ManualReview,
        )
    }
}

/// Deterministic identifier: UUIDv5 over the normalized email, the source
/// document reference and the resume text. Reprocessing the same resume gives
/// the same id; different documents sharing an email or a filename do not
/// collide.
pub fn candidate_id(email: &str, resume_ref: &str, text: &str) -> Uuid {
    let key = format!(
        "{}\n{}\n{}",
        email.trim().to_lowercase(),
        resume_ref,
        text.trim()
    );
    Uuid::new_v5(&CANDIDATE_NAMESPACE, key.as_bytes())
}

/// Derives a distinct id for a record whose base id is already taken.
pub fn sequenced_id(id: Uuid, sequence: u64) -> Uuid {
    let mut key = id.as_bytes().to_vec();
    key.extend_from_slice(&sequence.to_be_bytes());
    Uuid::new_v5(&CANDIDATE_NAMESPACE, &key)
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

/// Removes duplicate skills (case-insensitive, trimmed) and empty entries.
pub fn dedup_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}
