//! `create-ticket`: file the current thread in the channel's Jira project.

use serde_json::{Map, Value};
use tracing::{info, warn};

use super::thread_root;
use crate::command::{Dispatcher, InvocationContext, Services};
use crate::jira::{self, escape_jira_markup, IssueTracker, TicketRequest};
use crate::slack::links;
use crate::{AppError, BoxFuture, Result};

/// Error text when the channel has no Jira project.
pub const NO_PROJECT: &str = "No Jira Project Configured";

/// How the requester appears in the ticket: a tracker mention when their
/// email maps to a tracker user, otherwise their Slack name.
async fn requester(ctx: &InvocationContext, services: &Services, tracker: &dyn IssueTracker) -> String {
    let Some(user_id) = ctx.user.as_deref() else {
        return "unknown".into();
    };

    let profile = match services.messenger.user_info(user_id).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!(user_id, %err, "could not read requester profile");
            return links::mention(user_id);
        }
    };

    if let Some(email) = profile.email.as_deref() {
        match tracker.find_mention_handle(email).await {
            Ok(Some(handle)) => return jira::mention(&handle),
            Ok(None) => {}
            Err(err) => warn!(%err, "jira user search failed"),
        }
    }

    profile
        .display_name
        .or(profile.real_name)
        .unwrap_or_else(|| user_id.to_owned())
}

fn parse_metadata(raw: Option<&str>) -> Result<Map<String, Value>> {
    match raw.map(serde_json::from_str::<Value>) {
        None => Ok(Map::new()),
        Some(Ok(Value::Object(map))) => Ok(map),
        Some(Ok(_)) => Err(AppError::InvalidInput(
            "Stored Jira metadata is not a JSON object".into(),
        )),
        Some(Err(err)) => Err(AppError::InvalidInput(format!(
            "Stored Jira metadata is not valid JSON: {err}"
        ))),
    }
}

/// Create a ticket from `<summary> <description>` plus thread context.
pub fn create_ticket<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let project = services
            .settings
            .get(&ctx.channel)
            .await?
            .and_then(|settings| settings.jira)
            .ok_or_else(|| AppError::NotFound(NO_PROJECT.into()))?;
        let tracker = services.issue_tracker()?;

        let root = thread_root(ctx, services).await?;
        let permalink = services.messenger.permalink(&ctx.channel, &root.ts).await?;
        let requested_by = requester(ctx, services, tracker).await;

        let ticket = TicketRequest {
            project: project.project_key,
            summary: ctx.arg(0).unwrap_or_default().to_owned(),
            description: format!(
                "{}\n\nSlack thread: {permalink}\nRequested by: {requested_by}",
                escape_jira_markup(ctx.arg(1).unwrap_or_default())
            ),
            issue_type: project.issue_type,
            metadata: parse_metadata(project.metadata.as_deref())?,
        };

        let url = tracker.create_ticket(&ticket).await?;
        info!(channel = %ctx.channel, %url, "ticket filed");
        services
            .messenger
            .post_reply(ctx.reply(format!("Ticket created: {url}")))
            .await
    })
}
