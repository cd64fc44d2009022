//! Pure state transition function
//!
//! Given the same session, action, and clock reading, this always produces
//! the same outcome and effect list, with no I/O. The runtime dispatcher is
//! the only writer: it applies the returned session (or its removal) as one
//! unit per inbound event.

use super::action::{token, Action};
use super::effect::{Choice, Effect, Keyboard};
use super::state::{ReportKind, Session, Step};
use super::validate::{validate_text, TextOutcome};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, PartialEq)]
pub struct TransitionResult {
    /// Updated session to write back; `None` destroys it
    pub session: Option<Session>,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    fn retain(session: Session) -> Self {
        Self {
            session: Some(session),
            effects: vec![],
        }
    }

    fn end() -> Self {
        Self {
            session: None,
            effects: vec![],
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Actions that have no defined transition at the current step. These are
/// stray inputs (stale buttons, photos outside the photo step) and are
/// dropped without touching the session.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("action {action:?} does not apply at step {step:?}")]
    NotApplicable { step: Step, action: Action },
}

/// Create a session for a fresh report and emit its opening prompt.
/// Replaces whatever session the user previously held.
pub fn start_flow(user_id: i64, chat_id: i64, kind: ReportKind, now: NaiveDateTime) -> TransitionResult {
    let session = Session::new(user_id, chat_id, kind, now);
    let opening = prompt_for_step(&session);
    TransitionResult::retain(session).with_effect(opening)
}

/// Apply one decoded action to an active session
pub fn transition(
    session: &Session,
    action: Action,
    now: NaiveDateTime,
) -> Result<TransitionResult, TransitionError> {
    let mut next = session.clone();
    next.touch(now);

    match (session.step, action) {
        // Cancellation wins at every step
        (_, Action::Cancel) => Ok(TransitionResult::end()
            .with_effect(cancelled_prompt())
            .with_effect(menu_prompt())),

        // Back-navigation via the static predecessor map; steps with no
        // predecessor restart the top-level menu with no kind selected
        (step, Action::Back) => match step.predecessor() {
            Some(prev) => {
                next.step = prev;
                let prompt = prompt_for_step(&next);
                Ok(TransitionResult::retain(next).with_effect(prompt))
            }
            None => Ok(TransitionResult::end().with_effect(menu_prompt())),
        },

        (Step::SelectPerson, Action::SelectPerson { id }) => {
            next.fields.person_id = Some(id);
            next.step = Step::SetDate;
            let prompt = prompt_for_step(&next);
            Ok(TransitionResult::retain(next).with_effect(prompt))
        }

        (Step::SelectArea, Action::SelectArea { area }) => {
            next.fields.area = Some(area);
            next.step = Step::SetDate;
            let prompt = prompt_for_step(&next);
            Ok(TransitionResult::retain(next).with_effect(prompt))
        }

        (Step::SetDate, Action::OccurredNow) => {
            next.fields.occurred_at = Some(now);
            next.step = Step::EnterNarrative;
            let confirmation = format!(
                "✅ Time set to: {}\n\n{}",
                now.format("%Y-%m-%d %H:%M"),
                NARRATIVE_PROMPT
            );
            Ok(TransitionResult::retain(next).with_effect(Effect::prompt(confirmation)))
        }

        (Step::SetDate, Action::OccurredCustom) => {
            next.step = Step::EnterCustomDate;
            let prompt = prompt_for_step(&next);
            Ok(TransitionResult::retain(next).with_effect(prompt))
        }

        // "done" is the only free-text exit from photo collection
        (Step::CollectPhotos, Action::Text(text)) => {
            if text.trim().eq_ignore_ascii_case("done") {
                next.step = Step::SelectAnonymity;
                let prompt = prompt_for_step(&next);
                Ok(TransitionResult::retain(next).with_effect(prompt))
            } else {
                // Stray chatter during photo collection; activity still counts
                Ok(TransitionResult::retain(next))
            }
        }

        (Step::CollectPhotos, Action::Photo { file_id }) => {
            next.photos.push(file_id);
            let echo = format!(
                "✅ Photo added ({} total). Send more or type 'done'.",
                next.photos.len()
            );
            Ok(TransitionResult::retain(next).with_effect(Effect::prompt(echo)))
        }

        (Step::CollectPhotos, Action::SkipPhotos) => {
            next.step = Step::SelectAnonymity;
            let prompt = prompt_for_step(&next);
            Ok(TransitionResult::retain(next).with_effect(prompt))
        }

        (Step::SelectAnonymity, Action::Anonymous(anonymous)) => {
            next.fields.anonymous = Some(anonymous);
            next.step = if anonymous { Step::Review } else { Step::EnterName };
            let prompt = prompt_for_step(&next);
            Ok(TransitionResult::retain(next).with_effect(prompt))
        }

        // Free text gated by the step's validator table
        (step, Action::Text(text)) => match validate_text(step, &text, now) {
            Some(TextOutcome::Occurred(ts)) => {
                next.fields.occurred_at = Some(ts);
                next.step = Step::EnterNarrative;
                let confirmation = format!(
                    "✅ Date set to: {}\n\n{}",
                    ts.format("%Y-%m-%d %H:%M"),
                    NARRATIVE_PROMPT
                );
                Ok(TransitionResult::retain(next).with_effect(Effect::prompt(confirmation)))
            }
            Some(TextOutcome::Narrative(narrative)) => {
                next.fields.narrative = Some(narrative);
                next.step = Step::CollectPhotos;
                let prompt = prompt_for_step(&next);
                Ok(TransitionResult::retain(next).with_effect(prompt))
            }
            Some(TextOutcome::ReporterName(name)) => {
                next.fields.reporter_name = Some(name);
                next.step = Step::Review;
                let prompt = prompt_for_step(&next);
                Ok(TransitionResult::retain(next).with_effect(prompt))
            }
            Some(TextOutcome::Reject { prompt }) => {
                Ok(TransitionResult::retain(next).with_effect(Effect::prompt(prompt)))
            }
            None => Err(TransitionError::NotApplicable {
                step,
                action: Action::Text(text),
            }),
        },

        (Step::Review, Action::Submit) => {
            Ok(TransitionResult::end().with_effect(Effect::Submit { session: next }))
        }

        (step, action) => Err(TransitionError::NotApplicable { step, action }),
    }
}

// ============================================================================
// Prompt rendering
// ============================================================================

const NARRATIVE_PROMPT: &str = "Please describe what happened (up to 500 characters):";

/// Render the prompt that introduces the session's current step. Also used
/// to re-show a step on back-navigation.
pub fn prompt_for_step(session: &Session) -> Effect {
    match session.step {
        Step::SelectPerson => Effect::SendPersonPicker { kind: session.kind },
        Step::SelectArea => Effect::prompt_with(
            area_prompt_text(session.kind),
            area_keyboard(session.kind),
        ),
        Step::SetDate => Effect::prompt_with("When did this occur?", date_keyboard()),
        Step::EnterCustomDate => Effect::prompt(
            "Enter date and time when this occurred.\n\n\
             <b>Format examples:</b>\n\
             • 2024-12-25 (date only, assumes 12:00 PM)\n\
             • 2024-12-25 14:30 (date and time)\n\
             • yesterday\n\
             • this morning\n\n\
             Or type 'back' to go back:",
        ),
        Step::EnterNarrative => Effect::prompt(NARRATIVE_PROMPT),
        Step::CollectPhotos => Effect::prompt_with(
            "Send photos now, or skip.\n\nType 'done' when finished with photos.",
            photos_keyboard(),
        ),
        Step::SelectAnonymity => {
            Effect::prompt_with("Submit this report anonymously?", anonymity_keyboard())
        }
        Step::EnterName => Effect::prompt("Please enter your name:"),
        Step::Review => review_prompt(session),
    }
}

/// Title line of the person picker; the button list itself is rendered by
/// the runtime from the directory
pub fn person_picker_text(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::ShoutOut => "<b>⭐ Shout-out</b>\n\nWho deserves recognition?",
        _ => "<b>Follow-up Report</b>\n\nWho is this about?",
    }
}

fn area_prompt_text(kind: ReportKind) -> String {
    format!("<b>{}</b>\n\nWhat area/equipment?", kind.label())
}

pub fn menu_prompt() -> Effect {
    let text = format!(
        "<b>Communication Manager Bot v{}</b>\n\n\
         Report operational issues and feedback:\n\n\
         • Follow-ups about team members\n\
         • Kitchen operational issues\n\
         • Facility issues (safety, cleanliness, etc.)\n\
         • Shout-outs for great work\n\n\
         What would you like to report?",
        env!("CARGO_PKG_VERSION")
    );
    Effect::prompt_with(
        text,
        vec![
            vec![Choice::new("👥 Follow-up", token::START_FOLLOWUP)],
            vec![Choice::new("🍳 Kitchen Issue", token::START_KITCHEN)],
            vec![Choice::new("🏢 Facility Issue", token::START_FACILITY)],
            vec![Choice::new("⭐ Shout-out", token::START_SHOUTOUT)],
        ],
    )
}

pub fn help_prompt() -> Effect {
    Effect::prompt(
        "<b>Communication Manager Commands:</b>\n\n\
         /report - Show main report menu\n\
         /followup - Report about team member\n\
         /kitchen - Report kitchen issue\n\
         /facility - Report facility issue\n\
         /shoutout - Give someone recognition\n\
         /cancel_comm - Cancel current report\n\
         /comm_help - Show this help\n\
         /comm_status - System diagnostics\n\n\
         <b>During Reports:</b>\n\
         • Send photos to attach them\n\
         • Type your description when asked\n\
         • Use buttons to navigate\n\
         • Type 'done' to finish photos\n\
         • Type 'back' to go to previous step",
    )
}

pub fn cancelled_prompt() -> Effect {
    Effect::prompt("❌ Report cancelled.\n\nUse /report to start a new report.")
}

fn date_keyboard() -> Keyboard {
    vec![
        vec![Choice::new("📅 Now", token::OCCURRED_NOW)],
        vec![Choice::new("✏️ Custom Date/Time", token::OCCURRED_CUSTOM)],
        vec![Choice::new("◀️ Back", token::GO_BACK)],
        vec![Choice::new("❌ Cancel", token::CANCEL)],
    ]
}

fn area_keyboard(kind: ReportKind) -> Keyboard {
    let mut rows: Keyboard = kind
        .area_options()
        .iter()
        .map(|area| vec![Choice::new(*area, format!("{}{}", token::AREA_PREFIX, area))])
        .collect();
    rows.push(vec![Choice::new("❌ Cancel", token::CANCEL)]);
    rows
}

fn photos_keyboard() -> Keyboard {
    vec![
        vec![Choice::new("⏭️ Skip Photos", token::SKIP_PHOTOS)],
        vec![Choice::new("◀️ Back", token::GO_BACK)],
        vec![Choice::new("❌ Cancel", token::CANCEL)],
    ]
}

fn anonymity_keyboard() -> Keyboard {
    vec![
        vec![Choice::new("👤 Submit Anonymously", token::ANONYMOUS_YES)],
        vec![Choice::new("📝 Include My Name", token::ANONYMOUS_NO)],
    ]
}

fn review_prompt(session: &Session) -> Effect {
    let occurred = session
        .fields
        .occurred_at
        .unwrap_or(session.started_at)
        .format("%Y-%m-%d %H:%M");
    let narrative = session.fields.narrative.as_deref().unwrap_or("");
    let anonymity = if session.fields.anonymous == Some(true) {
        "Yes".to_string()
    } else {
        format!(
            "No - {}",
            session.fields.reporter_name.as_deref().unwrap_or("Unknown")
        )
    };

    let text = format!(
        "<b>📋 Review {}</b>\n\n\
         <b>When:</b> {}\n\
         <b>Description:</b>\n{}\n\n\
         <b>Photos:</b> {}\n\
         <b>Anonymous:</b> {}\n\n\
         <b>Ready to submit to Notion?</b>",
        session.kind.label(),
        occurred,
        narrative,
        session.photos.len(),
        anonymity,
    );

    Effect::prompt_with(
        text,
        vec![
            vec![Choice::new("✅ Submit to Notion", token::SUBMIT)],
            vec![Choice::new("◀️ Back to Edit", token::GO_BACK)],
            vec![Choice::new("❌ Cancel Report", token::CANCEL)],
        ],
    )
}
