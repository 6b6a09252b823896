use anyhow::{Context, Result};

use crate::screening::orchestrator::AnalysisMode;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
/// Provider keys and the database are optional; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub max_concurrent_analyses: usize,
    pub resume_excerpt_chars: usize,
    pub interview: InterviewWindow,
}

/// Working-hours window used when slots are generated locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterviewWindow {
    pub window_days: u32,
    pub start_hour: u32,
    pub end_hour: u32,
    pub max_slots: usize,
}

impl Default for InterviewWindow {
    fn default() -> Self {
        Self {
            window_days: 7,
            start_hour: 9,
            end_hour: 17,
            max_slots: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            database_url: None,
            port: 8000,
            rust_log: "info".to_string(),
            max_concurrent_analyses: 4,
            resume_excerpt_chars: 4000,
            interview: InterviewWindow::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = InterviewWindow::default();

        Ok(Config {
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: optional_env("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", 8000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_concurrent_analyses: parse_env::<usize>("MAX_CONCURRENT_ANALYSES", 4)?.max(1),
            resume_excerpt_chars: parse_env("RESUME_EXCERPT_CHARS", 4000)?,
            interview: InterviewWindow {
                window_days: parse_env("INTERVIEW_WINDOW_DAYS", defaults.window_days)?,
                start_hour: parse_env("INTERVIEW_START_HOUR", defaults.start_hour)?,
                end_hour: parse_env("INTERVIEW_END_HOUR", defaults.end_hour)?,
                max_slots: parse_env("INTERVIEW_MAX_SLOTS", defaults.max_slots)?,
            },
        })
    }

    /// The analysis mode the process starts in, derived from which provider
    /// credentials are present.
    pub fn initial_mode(&self) -> AnalysisMode {
        if self.gemini_api_key.is_some() {
            AnalysisMode::PrimaryAi
        } else if self.openai_api_key.is_some() {
            AnalysisMode::SecondaryAi
        } else {
            AnalysisMode::RuleBased
        }
    }
}

/// Treats unset and blank variables the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_keys(gemini: Option<&str>, openai: Option<&str>) -> Config {
        Config {
            gemini_api_key: gemini.map(String::from),
            openai_api_key: openai.map(String::from),
            ..Config::default()
        }
    }

    #[test]
    fn test_initial_mode_prefers_primary_provider() {
        let config = config_with_keys(Some("g"), Some("o"));
        assert_eq!(config.initial_mode(), AnalysisMode::PrimaryAi);
    }

    #[test]
    fn test_initial_mode_secondary_only() {
        let config = config_with_keys(None, Some("o"));
        assert_eq!(config.initial_mode(), AnalysisMode::SecondaryAi);
    }

    #[test]
    fn test_initial_mode_without_keys_is_rule_based() {
        let config = config_with_keys(None, None);
        assert_eq!(config.initial_mode(), AnalysisMode::RuleBased);
    }

    #[test]
    fn test_interview_window_defaults() {
        let window = InterviewWindow::default();
        assert_eq!(window.window_days, 7);
        assert_eq!((window.start_hour, window.end_hour), (9, 17));
        assert_eq!(window.max_slots, 20);
    }
}
