//! Concurrent fan-out and fan-in
//!
//! The [`Dispatcher`] launches one isolated call per enabled node; the
//! returned [`OutcomeStream`] gathers their outcomes as they complete.

pub mod collector;
pub mod dispatcher;
pub mod outcome;

pub use collector::{OutcomeStream, merge_text};
pub use dispatcher::{Dispatcher, Extraction};
pub use outcome::{
    DispatchOutcome, OutcomeKind, STATUS_DEADLINE, STATUS_FAILED, STATUS_TIMEOUT,
    STATUS_UNREACHABLE,
};
