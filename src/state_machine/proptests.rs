//! Property-based tests for the state machine
//!
//! Verifies the structural invariants hold across all inputs: every
//! transition lands on a step reachable for the session's report kind,
//! photo collection is append-only, and validators never mutate state on
//! rejection.

use super::action::Action;
use super::state::{ReportKind, Session, Step};
use super::transition::transition;
use super::validate::{parse_occurred, validate_text, TextOutcome};
use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(15, 0, 0)
        .unwrap()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_kind() -> impl Strategy<Value = ReportKind> {
    prop_oneof![
        Just(ReportKind::FollowUp),
        Just(ReportKind::KitchenIssue),
        Just(ReportKind::FacilityIssue),
        Just(ReportKind::ShoutOut),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::SelectPerson),
        Just(Step::SelectArea),
        Just(Step::SetDate),
        Just(Step::EnterCustomDate),
        Just(Step::EnterNarrative),
        Just(Step::CollectPhotos),
        Just(Step::SelectAnonymity),
        Just(Step::EnterName),
        Just(Step::Review),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Cancel),
        Just(Action::Back),
        Just(Action::OccurredNow),
        Just(Action::OccurredCustom),
        Just(Action::SkipPhotos),
        Just(Action::Submit),
        any::<bool>().prop_map(Action::Anonymous),
        "[a-z0-9-]{1,12}".prop_map(|id| Action::SelectPerson { id }),
        "[A-Za-z ]{1,16}".prop_map(|area| Action::SelectArea { area }),
        "[a-zA-Z0-9 .!-]{0,60}".prop_map(Action::Text),
        "[A-Za-z0-9_-]{4,24}".prop_map(|file_id| Action::Photo { file_id }),
    ]
}

fn arb_session() -> impl Strategy<Value = Session> {
    (arb_kind(), arb_step(), proptest::collection::vec("[a-z0-9]{6}", 0..4))
        .prop_filter("step must exist in the kind's sequence", |(kind, step, _)| {
            step.reachable_for(*kind)
        })
        .prop_map(|(kind, step, photos)| {
            let mut session = Session::new(42, 420, kind, now());
            session.step = step;
            session.photos = photos;
            session
        })
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    /// No event can set a step outside the session kind's declared sequence.
    #[test]
    fn transitions_stay_reachable(session in arb_session(), action in arb_action()) {
        if let Ok(result) = transition(&session, action, now()) {
            if let Some(next) = result.session {
                prop_assert!(
                    next.step.reachable_for(next.kind),
                    "{:?} unreachable for {:?}", next.step, next.kind
                );
            }
        }
    }

    /// The report kind is fixed at creation and never changes.
    #[test]
    fn kind_never_changes(session in arb_session(), action in arb_action()) {
        if let Ok(result) = transition(&session, action, now()) {
            if let Some(next) = result.session {
                prop_assert_eq!(next.kind, session.kind);
            }
        }
    }

    /// Photo references are append-only while the session lives.
    #[test]
    fn photos_are_append_only(session in arb_session(), action in arb_action()) {
        if let Ok(result) = transition(&session, action, now()) {
            if let Some(next) = result.session {
                prop_assert!(next.photos.len() >= session.photos.len());
                prop_assert_eq!(&next.photos[..session.photos.len()], &session.photos[..]);
            }
        }
    }

    /// A surviving session always has a fresher activity timestamp.
    #[test]
    fn accepted_input_touches_activity(session in arb_session(), action in arb_action()) {
        let later = now() + chrono::Duration::seconds(30);
        if let Ok(result) = transition(&session, action, later) {
            if let Some(next) = result.session {
                prop_assert_eq!(next.last_activity, later);
            }
        }
    }

    /// Validator rejection re-prompts without moving the step or storing
    /// a value.
    #[test]
    fn narrative_rejection_is_stateless(extra in 1usize..200) {
        let mut session = Session::new(42, 420, ReportKind::KitchenIssue, now());
        session.step = Step::EnterNarrative;
        let text = "x".repeat(500 + extra);
        let result = transition(&session, Action::Text(text), now()).unwrap();
        let kept = result.session.unwrap();
        prop_assert_eq!(kept.step, Step::EnterNarrative);
        prop_assert_eq!(kept.fields.narrative, None);
    }

    /// The date parser never accepts a timestamp after "now".
    #[test]
    fn parsed_dates_never_in_future(input in ".{0,24}") {
        if let Ok(ts) = parse_occurred(&input, now()) {
            prop_assert!(ts <= now());
        }
    }

    /// Free-text validation is pure: same input, same outcome.
    #[test]
    fn validators_are_deterministic(step in arb_step(), input in ".{0,80}") {
        let a = validate_text(step, &input, now());
        let b = validate_text(step, &input, now());
        prop_assert_eq!(a, b);
    }

    /// Narrative acceptance is exactly the 500-char rule.
    #[test]
    fn narrative_rule_matches_length(len in 0usize..600) {
        let input = "n".repeat(len);
        match validate_text(Step::EnterNarrative, &input, now()) {
            Some(TextOutcome::Narrative(stored)) => {
                prop_assert!(len <= 500);
                prop_assert_eq!(stored, input);
            }
            Some(TextOutcome::Reject { .. }) => prop_assert!(len > 500),
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }
}

proptest! {
    /// Following predecessors from any step terminates at a menu restart
    /// instead of cycling.
    #[test]
    fn predecessor_chains_terminate(step in arb_step()) {
        let mut current = step;
        let mut hops = 0;
        while let Some(prev) = current.predecessor() {
            current = prev;
            hops += 1;
            prop_assert!(hops <= Step::all().len(), "predecessor cycle at {:?}", step);
        }
    }
}
