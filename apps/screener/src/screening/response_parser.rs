//! AI Response Parser: turns a free-form completion into a validated `Assessment`.
//!
//! Recovery is an ordered pipeline of stages. Each stage derives a candidate
//! JSON string from the raw text; the first candidate that validates wins.

use std::borrow::Cow;

use serde_json::Value;

use crate::llm_client::strip_json_fences;
use crate::screening::models::{AnalysisOutcome, Assessment};

pub const NO_VALID_OUTPUT: &str = "no valid structured output";

/// One recovery strategy, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// The whole response (minus code fences) is the JSON document.
    Direct,
    /// The first top-level `{...}` block inside surrounding prose.
    BraceBlock,
    /// The brace block with raw control characters repaired and single-quoted strings normalized.
    Sanitized,
}

pub const STAGES: [ParseStage; 3] = [ParseStage::Direct, ParseStage::BraceBlock, ParseStage::Sanitized];

impl ParseStage {
    /// The text this stage will try to parse, or `None` when its precondition fails.
    pub fn candidate<'a>(&self, raw: &'a str) -> Option<Cow<'a, str>> {
        match self {
            ParseStage::Direct => Some(Cow::Borrowed(strip_json_fences(raw))),
            ParseStage::BraceBlock => first_brace_block(raw).map(Cow::Borrowed),
            ParseStage::Sanitized => first_brace_block(raw).map(|block| Cow::Owned(sanitize(block))),
        }
    }
}

/// Parses a model completion, recording which stage succeeded.
pub fn parse_with_stage(raw: &str) -> Result<(Assessment, ParseStage), String> {
    let mut last_reason = NO_VALID_OUTPUT.to_string();

    for stage in STAGES {
        let Some(candidate) = stage.candidate(raw) else {
            continue;
        };
        match serde_json::from_str::<Value>(&candidate) {
            Ok(value) => match validate(&value) {
                Ok(assessment) => return Ok((assessment, stage)),
                Err(reason) => last_reason = reason,
            },
            Err(_) => continue,
        }
    }

    Err(last_reason)
}

pub fn parse(raw: &str) -> AnalysisOutcome {
    match parse_with_stage(raw) {
        Ok((assessment, _)) => AnalysisOutcome::Scored(assessment),
        Err(reason) => AnalysisOutcome::Failed(reason),
    }
}

/// Checks required fields and applies defaults to optional ones.
fn validate(value: &Value) -> Result<Assessment, String> {
    let object = value
        .as_object()
        .ok_or_else(|| NO_VALID_OUTPUT.to_string())?;

    let score = object
        .get("score")
        .and_then(coerce_f64)
        .ok_or_else(|| "missing or non-numeric 'score'".to_string())?;

    let summary = object
        .get("summary")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing 'summary'".to_string())?
        .to_string();

    let skills_match = object
        .get("skills_match")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let experience_years = object
        .get("experience_years")
        .and_then(coerce_f64)
        .map(|years| years.max(0.0).round() as u32)
        .unwrap_or(0);

    Ok(Assessment {
        score,
        summary,
        skills_match,
        experience_years,
    }
    .normalized())
}

/// Numbers, or strings holding a number ("82", "82.5").
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Finds the first balanced `{...}` block, ignoring braces inside strings.
/// An unbalanced block extends to the last closing brace in the text.
fn first_brace_block(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Repairs a near-JSON block. Single-quoted strings become double-quoted,
/// raw newlines and tabs inside strings are escaped, and other control
/// characters are dropped. Apostrophes inside double-quoted strings are kept.
fn sanitize(block: &str) -> String {
    let mut out = String::with_capacity(block.len());
    let mut in_string: Option<char> = None;
    let mut chars = block.chars();

    while let Some(ch) = chars.next() {
        let Some(quote) = in_string else {
            match ch {
                '"' | '\'' => {
                    in_string = Some(ch);
                    out.push('"');
                }
                '\n' | '\r' | '\t' => out.push(ch),
                c if c.is_control() => {}
                c => out.push(c),
            }
            continue;
        };
        match ch {
            '\\' => match chars.next() {
                // \' is not a JSON escape
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => {}
            },
            c if c == quote => {
                in_string = None;
                out.push('"');
            }
            // Only reachable inside a single-quoted string.
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
