//! On-call resolution: schedule reference parsing and the source cascade.

pub mod reference;
pub mod resolver;

pub use reference::{ReferenceKind, ScheduleReference};
pub use resolver::{OnCallOutcome, OnCallResolver};
