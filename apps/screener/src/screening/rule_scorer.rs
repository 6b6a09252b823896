//! Rule-Based Scorer: deterministic 0-100 fit score from resume text and job text.
//!
//! This is both the default analysis path when no AI provider is configured and
//! the safety net when an AI call fails for a single resume. No external calls,
//! no randomness: identical inputs always produce identical output.

use crate::screening::models::{clamp_score, Assessment, ContactFields};

// ────────────────────────────────────────────────────────────────────────────
// Weights and keyword tables
// ────────────────────────────────────────────────────────────────────────────

/// Points for a skill present in both the resume and the job text.
const MATCHED_SKILL_POINTS: f64 = 15.0;
/// Points for a skill present in the resume only.
const RESUME_ONLY_SKILL_POINTS: f64 = 5.0;
const POINTS_PER_EXPERIENCE_YEAR: f64 = 5.0;
const MAX_EXPERIENCE_POINTS: f64 = 30.0;
const EDUCATION_POINTS: f64 = 10.0;
const TITLE_RELEVANCE_POINTS: f64 = 20.0;
const SUMMARY_TOP_SKILLS: usize = 3;

pub const SUMMARY_PREFIX: &str = "Rule-based assessment:";

/// Skill taxonomy. Keywords are lowercase and appear in exactly one category.
pub const SKILL_TAXONOMY: &[(&str, &[&str])] = &[
    (
        "programming",
        &[
            "python", "java", "javascript", "typescript", "c++", "c#", "rust", "go", "ruby",
            "php", "scala", "kotlin", "swift",
        ],
    ),
    (
        "data",
        &[
            "sql", "postgresql", "mysql", "mongodb", "pandas", "numpy", "spark", "hadoop",
            "tableau", "power bi", "machine learning", "deep learning", "tensorflow",
            "pytorch", "data analysis", "statistics",
        ],
    ),
    (
        "cloud",
        &["aws", "azure", "gcp", "google cloud", "cloud", "serverless", "lambda"],
    ),
    (
        "web",
        &[
            "react", "angular", "vue", "node.js", "django", "flask", "html", "css",
            "rest api", "graphql",
        ],
    ),
    (
        "mobile",
        &["android", "ios", "react native", "flutter", "xamarin"],
    ),
    (
        "devops",
        &[
            "docker", "kubernetes", "jenkins", "terraform", "ansible", "ci/cd", "git",
            "linux", "devops",
        ],
    ),
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "bachelor",
    "master",
    "degree",
    "university",
    "computer science",
    "engineering",
];

const TITLE_KEYWORDS: &[&str] = &[
    "developer",
    "engineer",
    "analyst",
    "scientist",
    "architect",
    "manager",
    "designer",
    "consultant",
    "administrator",
];

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Per-signal breakdown kept alongside the total for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub title_relevance: f64,
    pub matched_skills: Vec<String>,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        clamp_score(self.skills + self.experience + self.education + self.title_relevance)
    }
}

/// Scores a resume against job text using the extracted fields.
pub fn score(resume_text: &str, job_text: &str, fields: &ContactFields) -> Assessment {
    let breakdown = breakdown(resume_text, job_text, fields.experience_years);
    let has_education = breakdown.education > 0.0;

    Assessment {
        score: breakdown.total(),
        summary: build_summary(&breakdown.matched_skills, fields.experience_years, has_education),
        skills_match: breakdown.matched_skills,
        experience_years: fields.experience_years,
    }
}

pub fn breakdown(resume_text: &str, job_text: &str, experience_years: u32) -> ScoreBreakdown {
    let resume = resume_text.to_lowercase();
    let job = job_text.to_lowercase();

    let mut result = ScoreBreakdown::default();

    for (_, keywords) in SKILL_TAXONOMY {
        for keyword in keywords.iter() {
            if !contains_term(&resume, keyword) {
                continue;
            }
            if contains_term(&job, keyword) {
                result.skills += MATCHED_SKILL_POINTS;
                if !result.matched_skills.iter().any(|s| s == keyword) {
                    result.matched_skills.push(keyword.to_string());
                }
            } else {
                result.skills += RESUME_ONLY_SKILL_POINTS;
            }
        }
    }

    result.experience =
        (experience_years as f64 * POINTS_PER_EXPERIENCE_YEAR).min(MAX_EXPERIENCE_POINTS);

    if EDUCATION_KEYWORDS.iter().any(|k| contains_term(&resume, k)) {
        result.education = EDUCATION_POINTS;
    }

    if TITLE_KEYWORDS
        .iter()
        .any(|k| contains_term(&resume, k) && contains_term(&job, k))
    {
        result.title_relevance = TITLE_RELEVANCE_POINTS;
    }

    result
}

/// Whole-term match: the characters around an occurrence must not be
/// alphanumeric, so "go" does not match "google" and "java" not "javascript".
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Summary from the strongest available signal, in priority order.
fn build_summary(matched_skills: &[String], experience_years: u32, has_education: bool) -> String {
    if !matched_skills.is_empty() {
        let top: Vec<&str> = matched_skills
            .iter()
            .take(SUMMARY_TOP_SKILLS)
            .map(String::as_str)
            .collect();
        format!("{SUMMARY_PREFIX} matches required skills: {}.", top.join(", "))
    } else if experience_years > 0 {
        format!("{SUMMARY_PREFIX} {experience_years} years of relevant experience.")
    } else if has_education {
        format!("{SUMMARY_PREFIX} relevant education present.")
    } else {
        format!("{SUMMARY_PREFIX} no clear signals found, requires manual review.")
    }
}
