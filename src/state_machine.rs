//! Core report-conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the engine consumes decoded actions and produces effect commands, and
//! performs no I/O of its own.

pub mod action;
mod effect;
pub mod state;
pub mod transition;
pub mod validate;

#[cfg(test)]
mod proptests;

pub use action::Action;
pub use effect::{Choice, Effect, Keyboard};
pub use state::{ReportKind, Session, Step};
pub use transition::{start_flow, transition, TransitionResult};
