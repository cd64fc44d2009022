//! Per-step input validators
//!
//! Pure functions of (step, raw input) that either accept-and-transform or
//! reject with a re-prompt. The step-to-rule mapping is a table so new
//! steps plug in without touching the transition dispatch.

use super::state::{Step, MAX_NARRATIVE_CHARS};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Accepted-and-transformed free text, or a rejection with the prompt to
/// re-send. Rejections leave the session unchanged except the activity
/// timestamp.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    Occurred(NaiveDateTime),
    Narrative(String),
    ReporterName(String),
    Reject { prompt: String },
}

type TextRule = fn(&str, NaiveDateTime) -> TextOutcome;

const TEXT_RULES: &[(Step, TextRule)] = &[
    (Step::EnterCustomDate, custom_date_rule),
    (Step::EnterNarrative, narrative_rule),
    (Step::EnterName, name_rule),
];

/// Run the step's free-text rule. `None` means the step takes no free text.
pub fn validate_text(step: Step, input: &str, now: NaiveDateTime) -> Option<TextOutcome> {
    TEXT_RULES
        .iter()
        .find(|(s, _)| *s == step)
        .map(|(_, rule)| rule(input, now))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("unrecognized date expression")]
    Unrecognized,
    #[error("date is in the future")]
    Future,
}

/// Parse an occurrence timestamp from a small closed vocabulary plus two
/// explicit formats. Anything strictly after `now` is rejected.
pub fn parse_occurred(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime, DateParseError> {
    let normalized = input.trim().to_lowercase();

    let parsed = match normalized.as_str() {
        "yesterday" => Some(now - Duration::days(1)),
        "today" | "this morning" | "morning" => now.date().and_hms_opt(9, 0, 0),
        "this afternoon" | "afternoon" => now.date().and_hms_opt(14, 0, 0),
        _ => NaiveDateTime::parse_from_str(input.trim(), "%Y-%m-%d %H:%M")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(12, 0, 0))
            }),
    };

    match parsed {
        Some(ts) if ts > now => Err(DateParseError::Future),
        Some(ts) => Ok(ts),
        None => Err(DateParseError::Unrecognized),
    }
}

fn custom_date_rule(input: &str, now: NaiveDateTime) -> TextOutcome {
    match parse_occurred(input, now) {
        Ok(ts) => TextOutcome::Occurred(ts),
        Err(DateParseError::Future) => TextOutcome::Reject {
            prompt: "❌ Invalid date or future date not allowed.\n\
                     Please try again or type 'back':"
                .to_string(),
        },
        Err(DateParseError::Unrecognized) => TextOutcome::Reject {
            prompt: "❌ Could not understand that date format.\n\
                     Please try again or type 'back':"
                .to_string(),
        },
    }
}

fn narrative_rule(input: &str, _now: NaiveDateTime) -> TextOutcome {
    if input.chars().count() > MAX_NARRATIVE_CHARS {
        TextOutcome::Reject {
            prompt: "Please keep description under 500 characters.".to_string(),
        }
    } else {
        TextOutcome::Narrative(input.to_string())
    }
}

fn name_rule(input: &str, _now: NaiveDateTime) -> TextOutcome {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        TextOutcome::Reject {
            prompt: "Please enter a valid name:".to_string(),
        }
    } else {
        TextOutcome::ReporterName(trimmed.to_string())
    }
}
