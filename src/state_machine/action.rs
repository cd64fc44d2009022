//! Decoded user actions
//!
//! Commands, callback tokens, free text, and photo events are decoded into
//! this closed variant once at the gateway boundary; nothing deeper in the
//! engine branches on raw strings.

use super::state::ReportKind;

/// Callback tokens, consumed verbatim on the next callback event
pub mod token {
    pub const START_FOLLOWUP: &str = "start_followup";
    pub const START_KITCHEN: &str = "start_kitchen";
    pub const START_FACILITY: &str = "start_facility";
    pub const START_SHOUTOUT: &str = "start_shoutout";
    pub const PERSON_PREFIX: &str = "person_";
    pub const AREA_PREFIX: &str = "area_";
    pub const OCCURRED_NOW: &str = "occurred_now";
    pub const OCCURRED_CUSTOM: &str = "occurred_custom";
    pub const GO_BACK: &str = "go_back";
    pub const SKIP_PHOTOS: &str = "skip_photos";
    pub const ANONYMOUS_YES: &str = "anonymous_yes";
    pub const ANONYMOUS_NO: &str = "anonymous_no";
    pub const SUBMIT: &str = "submit";
    pub const CANCEL: &str = "cancel";
}

/// One user input, decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show the top-level report menu
    OpenMenu,
    Help,
    Status,
    /// Begin a new report, replacing any session in progress
    Start(ReportKind),
    Cancel,
    SelectPerson { id: String },
    SelectArea { area: String },
    OccurredNow,
    OccurredCustom,
    Back,
    SkipPhotos,
    Anonymous(bool),
    Submit,
    /// Free text, interpreted by the current step's validator
    Text(String),
    /// Photo attachment reference
    Photo { file_id: String },
}

impl Action {
    /// Decode a slash command. Returns `None` for unrecognized commands.
    pub fn from_command(command: &str) -> Option<Action> {
        match command {
            "/report" => Some(Action::OpenMenu),
            "/followup" => Some(Action::Start(ReportKind::FollowUp)),
            "/kitchen" => Some(Action::Start(ReportKind::KitchenIssue)),
            "/facility" => Some(Action::Start(ReportKind::FacilityIssue)),
            "/shoutout" => Some(Action::Start(ReportKind::ShoutOut)),
            "/cancel_comm" => Some(Action::Cancel),
            "/comm_help" => Some(Action::Help),
            "/comm_status" => Some(Action::Status),
            _ => None,
        }
    }

    /// Decode a callback token. Returns `None` for unrecognized data.
    pub fn from_callback(data: &str) -> Option<Action> {
        if let Some(id) = data.strip_prefix(token::PERSON_PREFIX) {
            return Some(Action::SelectPerson { id: id.to_string() });
        }
        if let Some(area) = data.strip_prefix(token::AREA_PREFIX) {
            return Some(Action::SelectArea {
                area: area.to_string(),
            });
        }
        match data {
            token::START_FOLLOWUP => Some(Action::Start(ReportKind::FollowUp)),
            token::START_KITCHEN => Some(Action::Start(ReportKind::KitchenIssue)),
            token::START_FACILITY => Some(Action::Start(ReportKind::FacilityIssue)),
            token::START_SHOUTOUT => Some(Action::Start(ReportKind::ShoutOut)),
            token::OCCURRED_NOW => Some(Action::OccurredNow),
            token::OCCURRED_CUSTOM => Some(Action::OccurredCustom),
            token::GO_BACK => Some(Action::Back),
            token::SKIP_PHOTOS => Some(Action::SkipPhotos),
            token::ANONYMOUS_YES => Some(Action::Anonymous(true)),
            token::ANONYMOUS_NO => Some(Action::Anonymous(false)),
            token::SUBMIT => Some(Action::Submit),
            token::CANCEL => Some(Action::Cancel),
            _ => None,
        }
    }

    /// Decode plain message text. "back" is a lexical escape hatch available
    /// at every step; everything else flows to the step validator.
    pub fn from_text(text: &str) -> Action {
        if text.trim().eq_ignore_ascii_case("back") {
            Action::Back
        } else {
            Action::Text(text.to_string())
        }
    }
}
