//! Command routing: tokenizer, registry, validators, dispatcher, and the
//! handlers registered at startup.

pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod tokenizer;
pub mod validator;

use std::sync::Arc;

use crate::jira::IssueTracker;
use crate::oncall::OnCallResolver;
use crate::pagerduty::ScheduleProvider;
use crate::persistence::{SettingsStore, TrackingStore};
use crate::slack::Messenger;
use crate::{AppError, Result};

pub use context::{EventKind, InboundEvent, InvocationContext};
pub use dispatcher::Dispatcher;
pub use registry::{CommandDescriptor, CommandRegistry, Handler};
pub use validator::{ArgValidator, MinMaxValidator};

/// Name of the fallback command run when nothing matches.
pub const DEFAULT_COMMAND: &str = "__DEFAULT__";

/// Collaborators shared by every handler.
#[derive(Clone)]
pub struct Services {
    /// Messaging platform.
    pub messenger: Arc<dyn Messenger>,
    /// On-call schedule provider.
    pub schedules: Arc<dyn ScheduleProvider>,
    /// Per-channel settings.
    pub settings: Arc<dyn SettingsStore>,
    /// Request log.
    pub tracking: Arc<dyn TrackingStore>,
    /// Issue tracker; `None` when Jira is not configured.
    pub issues: Option<Arc<dyn IssueTracker>>,
}

impl Services {
    /// On-call resolver over these collaborators.
    #[must_use]
    pub fn resolver(&self) -> OnCallResolver<'_> {
        OnCallResolver::new(
            self.settings.as_ref(),
            self.messenger.as_ref(),
            self.schedules.as_ref(),
        )
    }

    /// Issue tracker, or an error when none is configured.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when Jira is not configured.
    pub fn issue_tracker(&self) -> Result<&dyn IssueTracker> {
        self.issues
            .as_deref()
            .ok_or_else(|| AppError::Config("Jira is not configured for this bot".into()))
    }
}

/// Build the command table.
#[must_use]
pub fn build_registry() -> CommandRegistry {
    use handlers::{channel, help, oncall, settings, summary, thread, ticket};

    let mut registry = CommandRegistry::new(
        CommandDescriptor::new(DEFAULT_COMMAND, oncall::ping_current_channel)
            .usage("")
            .help("if none of the command matched, we will ping the oncall person for the current channel"),
    );

    registry
        .register(
            CommandDescriptor::new("help", help::help)
                .usage("help")
                .help("show help message"),
        )
        .register(
            CommandDescriptor::new("set-pagerduty", settings::set_pagerduty)
                .usage("set-pagerduty <pagerduty_url>")
                .help("configure pagerduty for this channel")
                .validator(MinMaxValidator::exactly(1)),
        )
        .register(
            CommandDescriptor::new("get-pagerduty", settings::get_pagerduty)
                .usage("get-pagerduty [channel_name]")
                .help("query pagerduty for the specified channel if provided, otherwise query for the current channel")
                .validator(MinMaxValidator::at_most(1)),
        )
        .register(
            CommandDescriptor::new("set-sheet-url", settings::set_sheet_url)
                .usage("set-sheet-url <tracking_sheet_url>")
                .help("configure the request tracking sheet for this channel")
                .validator(MinMaxValidator::exactly(1)),
        )
        .register(
            CommandDescriptor::new("get-sheet-url", settings::get_sheet_url)
                .usage("get-sheet-url [channel_name]")
                .help("query the tracking sheet for the specified channel if provided, otherwise query for the current channel")
                .validator(MinMaxValidator::at_most(1)),
        )
        .register(
            CommandDescriptor::new("log-request", thread::log_request)
                .usage("log-request [subject]")
                .help("log the main thread as a request in the tracking sheet"),
        )
        .register(
            CommandDescriptor::new("mark-complete", thread::mark_complete)
                .usage("mark-complete")
                .help("mark the main thread as complete"),
        )
        .register(
            CommandDescriptor::new("unmark-complete", thread::unmark_complete)
                .usage("unmark-complete")
                .help("unmark the main thread as complete"),
        )
        .register(
            CommandDescriptor::new("ping", oncall::ping)
                .usage("ping <channel_name>")
                .help("ping oncall person for the specified channel")
                .validator(MinMaxValidator::exactly(1)),
        )
        .register(
            CommandDescriptor::new("join", channel::join)
                .usage("join <channel_name>")
                .help("join the specified channel")
                .validator(MinMaxValidator::exactly(1)),
        )
        .register(
            CommandDescriptor::new("summary", summary::summary)
                .usage("summary [channel_name] <start_time> <end_time>")
                .help("get the summary of the oncall for the specified channel")
                .validator(MinMaxValidator::between(2, 3)),
        )
        .register(
            CommandDescriptor::new("set-jira-project", settings::set_jira_project)
                .usage("set-jira-project <project_key> <issue_type> [metadata_json]")
                .help("configure the jira project tickets are filed in for this channel")
                .validator(MinMaxValidator::between(2, 3)),
        )
        .register(
            CommandDescriptor::new("get-jira-project", settings::get_jira_project)
                .usage("get-jira-project [channel_name]")
                .help("query the jira project for the specified channel if provided, otherwise query for the current channel")
                .validator(MinMaxValidator::at_most(1)),
        )
        .register(
            CommandDescriptor::new("create-ticket", ticket::create_ticket)
                .usage("create-ticket <summary> <description>")
                .help("create a jira ticket for the main thread")
                .validator(MinMaxValidator::exactly(2)),
        )
        .register(
            CommandDescriptor::new("channel-name", channel::channel_name)
                .usage("channel-name <channel_name>")
                .help("show the display name of a channel")
                .validator(MinMaxValidator::exactly(1))
                .hidden(),
        );

    registry
}
