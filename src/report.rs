//! Completed report records and the submission assembler
//!
//! Maps a finished session's collected fields into the record store's flat
//! field set, with report-kind-specific inclusion rules. The record is
//! immutable once sent; the store assigns the durable identifier.

use crate::state_machine::{ReportKind, Session};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Fixed `source` tag stamped on every record
pub const SOURCE_TAG: &str = "Telegram";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    pub title: String,
    pub kind: ReportKind,
    pub narrative: String,
    pub occurred_at: NaiveDateTime,
    pub anonymous: bool,
    /// Present only when not anonymous
    pub reporter_name: Option<String>,
    /// Present only for FollowUp / ShoutOut
    pub person_name: Option<String>,
    /// Present only for KitchenIssue / FacilityIssue
    pub area: Option<String>,
    /// Durable URLs, in attachment order, after resolution
    pub photo_urls: Vec<String>,
}

/// Build the record from a session that reached review. `person_name` is
/// the directory-resolved display name for the stored person reference;
/// `now` backstops a missing occurrence timestamp.
pub fn assemble(
    session: &Session,
    person_name: Option<String>,
    photo_urls: Vec<String>,
    now: NaiveDateTime,
) -> ReportRecord {
    let occurred_at = session.fields.occurred_at.unwrap_or(now);
    let anonymous = session.fields.anonymous.unwrap_or(false);

    ReportRecord {
        title: format!("{} - {}", session.kind.label(), occurred_at.format("%Y-%m-%d")),
        kind: session.kind,
        narrative: session.fields.narrative.clone().unwrap_or_default(),
        occurred_at,
        anonymous,
        reporter_name: if anonymous {
            None
        } else {
            session.fields.reporter_name.clone()
        },
        person_name: if session.kind.uses_person() {
            person_name
        } else {
            None
        },
        area: if session.kind.uses_person() {
            None
        } else {
            session.fields.area.clone()
        },
        photo_urls,
    }
}
