//! Session state types

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Idle timeout after which a session stops accepting input
pub const DEFAULT_SESSION_TIMEOUT_SECS: i64 = 30 * 60;

/// Narrative length limit in Unicode scalar values
pub const MAX_NARRATIVE_CHARS: usize = 500;

/// Person-picker keyboards are capped to keep them scrollable
pub const MAX_PICKER_ENTRIES: usize = 20;

/// Category of report being filed. Fixed at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    FollowUp,
    KitchenIssue,
    FacilityIssue,
    ShoutOut,
}

impl ReportKind {
    /// Human-facing label, also the record store's `item_type` value
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::FollowUp => "Follow-up",
            ReportKind::KitchenIssue => "Kitchen Issue",
            ReportKind::FacilityIssue => "Facility Issue",
            ReportKind::ShoutOut => "Shout-out",
        }
    }

    /// Whether this kind opens with a person picker (vs. an area picker)
    pub fn uses_person(self) -> bool {
        matches!(self, ReportKind::FollowUp | ReportKind::ShoutOut)
    }

    /// Selectable areas for the area-picker kinds
    pub fn area_options(self) -> &'static [&'static str] {
        match self {
            ReportKind::KitchenIssue => &[
                "Prep Station",
                "Grill",
                "Fryer",
                "Oven",
                "Dishwasher",
                "Refrigerator",
                "Other",
            ],
            ReportKind::FacilityIssue => &[
                "Dining Room",
                "Restrooms",
                "HVAC",
                "Lighting",
                "Plumbing",
                "Other",
            ],
            ReportKind::FollowUp | ReportKind::ShoutOut => &[],
        }
    }

    /// First real step after session creation
    pub fn first_step(self) -> Step {
        if self.uses_person() {
            Step::SelectPerson
        } else {
            Step::SelectArea
        }
    }

    pub fn all() -> [ReportKind; 4] {
        [
            ReportKind::FollowUp,
            ReportKind::KitchenIssue,
            ReportKind::FacilityIssue,
            ReportKind::ShoutOut,
        ]
    }
}

/// Position in a report kind's guided-input sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    SelectPerson,
    SelectArea,
    SetDate,
    EnterCustomDate,
    EnterNarrative,
    CollectPhotos,
    SelectAnonymity,
    EnterName,
    Review,
}

impl Step {
    /// Static predecessor map for back-navigation, kept next to the forward
    /// transitions so the two cannot drift apart. `None` means back restarts
    /// the top-level menu.
    pub fn predecessor(self) -> Option<Step> {
        match self {
            Step::SelectPerson | Step::SelectArea | Step::SetDate => None,
            Step::EnterCustomDate | Step::EnterNarrative => Some(Step::SetDate),
            Step::CollectPhotos => Some(Step::EnterNarrative),
            Step::SelectAnonymity => Some(Step::CollectPhotos),
            Step::EnterName | Step::Review => Some(Step::SelectAnonymity),
        }
    }

    /// Whether this step exists in the given kind's sequence
    pub fn reachable_for(self, kind: ReportKind) -> bool {
        match self {
            Step::SelectPerson => kind.uses_person(),
            Step::SelectArea => !kind.uses_person(),
            _ => true,
        }
    }

    pub fn all() -> [Step; 9] {
        [
            Step::SelectPerson,
            Step::SelectArea,
            Step::SetDate,
            Step::EnterCustomDate,
            Step::EnterNarrative,
            Step::CollectPhotos,
            Step::SelectAnonymity,
            Step::EnterName,
            Step::Review,
        ]
    }
}

/// Values collected so far. Keys fill in as steps complete and are only
/// cleared by a full reset; re-answering an earlier step overwrites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFields {
    pub person_id: Option<String>,
    pub area: Option<String>,
    pub narrative: Option<String>,
    pub occurred_at: Option<NaiveDateTime>,
    pub anonymous: Option<bool>,
    pub reporter_name: Option<String>,
}

/// One user's in-progress report-filing conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub chat_id: i64,
    pub kind: ReportKind,
    pub step: Step,
    pub fields: ReportFields,
    /// Opaque attachment references, append-only during photo collection
    pub photos: Vec<String>,
    pub started_at: NaiveDateTime,
    pub last_activity: NaiveDateTime,
}

impl Session {
    pub fn new(user_id: i64, chat_id: i64, kind: ReportKind, now: NaiveDateTime) -> Self {
        Self {
            user_id,
            chat_id,
            kind,
            step: kind.first_step(),
            fields: ReportFields::default(),
            photos: Vec::new(),
            started_at: now,
            last_activity: now,
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime, timeout: Duration) -> bool {
        now - self.last_activity > timeout
    }

    /// Record accepted input; called on every transition, including
    /// validation rejections
    pub fn touch(&mut self, now: NaiveDateTime) {
        self.last_activity = now;
    }
}
