//! Effects produced by state transitions
//!
//! The transition function is pure; everything that touches the outside
//! world is described here and executed by the runtime dispatcher.

use super::state::{ReportKind, Session};

/// One labeled button; `data` is the callback token echoed back verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub data: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// Rows of buttons attached to a prompt
pub type Keyboard = Vec<Vec<Choice>>;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Send a prompt to the originating chat
    SendPrompt {
        text: String,
        keyboard: Option<Keyboard>,
    },

    /// Fetch the directory and render the person picker for this kind.
    /// Rendered by the runtime because the people list requires I/O.
    SendPersonPicker { kind: ReportKind },

    /// Resolve photos, assemble the record, and hand off to the record
    /// store. Carries a snapshot because the session itself is destroyed.
    Submit { session: Session },
}

impl Effect {
    pub fn prompt(text: impl Into<String>) -> Self {
        Effect::SendPrompt {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn prompt_with(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Effect::SendPrompt {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}
