//! Resume Field Extractor: pulls contact details and an experience estimate
//! out of raw resume text with ordered heuristics. Pure; no I/O.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::screening::models::ContactFields;

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

const NAME_SCAN_LINES: usize = 5;
const NAME_MAX_CHARS: usize = 50;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{L}+(?:\s+\p{L}+)*$").unwrap());
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});
static PHONE_LOOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+?[1-9]?[0-9]{7,15}").unwrap());
static PHONE_STRICT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{3}-\d{4}\b").unwrap());
static YEARS_EXPERIENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\+?\s*(?:years?|yrs?)\s+(?:of\s+)?(?:\w+\s+)?experience").unwrap()
});
static YEARS_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\+?\s*(?:years?|yrs?)\s+in\b").unwrap());
static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b20\d{2}\s*(?:-|–|—|to)\s*(?:20\d{2}\b|present\b|current\b|now\b)").unwrap()
});

/// Extracts name, email, phone and estimated experience years.
pub fn extract(raw_text: &str) -> ContactFields {
    ContactFields {
        name: extract_name(raw_text),
        email: extract_email(raw_text),
        phone: extract_phone(raw_text),
        experience_years: estimate_experience_years(raw_text),
    }
}

/// First of the leading lines that looks like a person's name, title-cased.
pub fn extract_name(text: &str) -> String {
    text.lines()
        .take(NAME_SCAN_LINES)
        .map(str::trim)
        .find(|line| is_name_line(line))
        .map(title_case)
        .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string())
}

fn is_name_line(line: &str) -> bool {
    let words = line.split_whitespace().count();
    (2..=4).contains(&words)
        && line.chars().count() < NAME_MAX_CHARS
        && !line.contains('@')
        && NAME_PATTERN.is_match(line)
}

fn title_case(line: &str) -> String {
    line.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn extract_email(text: &str) -> String {
    EMAIL_PATTERN
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Loose international pattern first, then the strict NNN-NNN-NNNN form.
pub fn extract_phone(text: &str) -> String {
    PHONE_LOOSE
        .find(text)
        .or_else(|| PHONE_STRICT.find(text))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Explicit "N years experience" / "N years in" phrasing wins; otherwise two
/// years per dated role range. Never below one.
pub fn estimate_experience_years(text: &str) -> u32 {
    for pattern in [&*YEARS_EXPERIENCE, &*YEARS_IN] {
        if let Some(years) = pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            return years;
        }
    }

    let ranges = DATE_RANGE.find_iter(text).count() as u32;
    ranges.saturating_mul(2).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESUME: &str = "JANE ELIZABETH DOE\n\
        jane.doe@example.com | 555-123-4567\n\
        Senior Data Engineer with 7 years experience building pipelines.\n\
        Acme Corp 2019 - Present\n\
        Beta LLC 2015 - 2019\n";

    #[test]
    fn test_extract_full_resume() {
        let fields = extract(SAMPLE_RESUME);
        assert_eq!(fields.name, "Jane Elizabeth Doe");
        assert_eq!(fields.email, "jane.doe@example.com");
        assert_eq!(fields.phone, "555-123-4567");
        assert_eq!(fields.experience_years, 7);
    }

    #[test]
    fn test_name_skips_lines_with_digits_or_email() {
        let text = "Resume 2024\njohn@example.com\njohn smith\n";
        assert_eq!(extract_name(text), "John Smith");
    }

    #[test]
    fn test_name_rejects_single_word_and_long_lines() {
        let text = "Curriculum\nThis Line Has Far Too Many Words To Be A Name\n";
        assert_eq!(extract_name(text), UNKNOWN_CANDIDATE);
    }

    #[test]
    fn test_name_only_scans_first_five_lines() {
        let text = "a1\nb2\nc3\nd4\ne5\nMaria Garcia\n";
        assert_eq!(extract_name(text), UNKNOWN_CANDIDATE);
    }

    #[test]
    fn test_name_rejects_punctuation() {
        assert_eq!(extract_name("Skills: Rust, Go\n"), UNKNOWN_CANDIDATE);
    }

    #[test]
    fn test_email_missing_is_empty() {
        assert_eq!(extract_email("no contact here"), "");
    }

    #[test]
    fn test_phone_prefers_loose_international() {
        assert_eq!(extract_phone("Call +14155550123 or 555-123-4567"), "+14155550123");
    }

    #[test]
    fn test_phone_strict_fallback() {
        assert_eq!(extract_phone("Phone: 415-555-0123"), "415-555-0123");
    }

    #[test]
    fn test_phone_missing_is_empty() {
        assert_eq!(extract_phone("Phone: ask me"), "");
    }

    #[test]
    fn test_years_in_phrasing() {
        assert_eq!(estimate_experience_years("5 years in backend development"), 5);
    }

    #[test]
    fn test_years_of_experience_phrasing() {
        assert_eq!(estimate_experience_years("Over 10+ years of experience"), 10);
    }

    #[test]
    fn test_years_from_date_ranges() {
        let text = "Acme 2020 - 2023\nBeta 2017–2020\nGamma 2023 - present";
        assert_eq!(estimate_experience_years(text), 6);
    }

    #[test]
    fn test_years_default_is_one() {
        assert_eq!(estimate_experience_years(""), 1);
        assert_eq!(estimate_experience_years("Fresh graduate"), 1);
    }

    #[test]
    fn test_empty_text_yields_defaults() {
        let fields = extract("");
        assert_eq!(fields.name, UNKNOWN_CANDIDATE);
        assert!(fields.email.is_empty());
        assert!(fields.phone.is_empty());
        assert_eq!(fields.experience_years, 1);
    }
}
