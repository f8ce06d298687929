#![forbid(unsafe_code)]

//! `oncall-bot`: Slack mention bot that routes commands to handlers
//! backed by a per-channel settings store, `PagerDuty`, and Jira.

use std::future::Future;
use std::pin::Pin;

pub mod command;
pub mod config;
pub mod dates;
pub mod errors;
pub mod jira;
pub mod models;
pub mod oncall;
pub mod pagerduty;
pub mod persistence;
pub mod slack;

pub use config::BotConfig;
pub use errors::{AppError, Result};

/// Boxed, sendable future resolving to a [`Result`]; the return type of
/// every collaborator trait method.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;
