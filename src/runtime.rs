//! Runtime around the pure state machine
//!
//! The dispatcher decodes incoming updates into actions, feeds them through
//! the transition function, and executes the resulting effects against the
//! gateway and record store. All I/O lives behind the traits in
//! [`traits`], so the whole dispatch path is testable with mocks.

mod dispatcher;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use dispatcher::Dispatcher;
