//! Per-channel settings commands.

use serde_json::Value;
use tracing::info;

use super::{display_name, target_channel};
use crate::command::{Dispatcher, InvocationContext, Services};
use crate::models::settings::{JiraProject, SettingsUpdate};
use crate::oncall::ScheduleReference;
use crate::slack::links::unwrap_link;
use crate::{AppError, BoxFuture, Result};

/// Persist `update` for the invoking channel, refreshing its cached name.
async fn save(ctx: &InvocationContext, services: &Services, update: SettingsUpdate) -> Result<()> {
    let name = display_name(services, &ctx.channel).await;
    services
        .settings
        .upsert(&ctx.channel, update.with_channel_name(name))
        .await?;
    info!(channel = %ctx.channel, "channel settings updated");
    Ok(())
}

async fn reply_markdown(ctx: &InvocationContext, services: &Services, text: String) -> Result<()> {
    services
        .messenger
        .post_reply(ctx.reply(text).markdown())
        .await
}

fn configured_reply(setter: &str, getter: &str) -> String {
    format!("Configure done, you can use `{setter}` to update or use `{getter}` to query the current settings")
}

fn required_link(ctx: &InvocationContext) -> Result<String> {
    let link = unwrap_link(ctx.arg(0).unwrap_or_default());
    if link.is_empty() {
        return Err(AppError::InvalidInput("A url is required".into()));
    }
    Ok(link)
}

/// Store the channel's schedule reference after checking its shape.
pub fn set_pagerduty<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let url = required_link(ctx)?;
        ScheduleReference::require(&url)?;

        let update = SettingsUpdate {
            pagerduty_url: Some(url),
            ..SettingsUpdate::default()
        };
        save(ctx, services, update).await?;
        reply_markdown(ctx, services, configured_reply("set-pagerduty", "get-pagerduty")).await
    })
}

/// Show the stored schedule reference.
pub fn get_pagerduty<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let channel = target_channel(ctx, 0);
        let url = services
            .settings
            .get(&channel)
            .await?
            .and_then(|settings| settings.pagerduty_url);

        let text = match url {
            Some(url) => format!("The pagerduty for this channel is `{url}`"),
            None => "No Settings Found. Please use `set-pagerduty PAGERDUTY_ID` to configure".into(),
        };
        reply_markdown(ctx, services, text).await
    })
}

/// Store the channel's tracking sheet.
pub fn set_sheet_url<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let update = SettingsUpdate {
            tracking_sheet: Some(required_link(ctx)?),
            ..SettingsUpdate::default()
        };
        save(ctx, services, update).await?;
        reply_markdown(ctx, services, configured_reply("set-sheet-url", "get-sheet-url")).await
    })
}

/// Show the stored tracking sheet.
pub fn get_sheet_url<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let channel = target_channel(ctx, 0);
        let sheet = services
            .settings
            .get(&channel)
            .await?
            .and_then(|settings| settings.tracking_sheet);

        let text = match sheet {
            Some(url) => format!("The logging google sheet url for this channel is `{url}`"),
            None => "No Settings Found. Please use `set-sheet-url GoogleSheetUrl` to configure".into(),
        };
        reply_markdown(ctx, services, text).await
    })
}

/// Check that `raw` is a JSON object and return it compacted.
///
/// # Errors
///
/// Returns `AppError::InvalidInput` for anything but a JSON object.
pub fn normalize_metadata(raw: &str) -> Result<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value.to_string()),
        Ok(_) => Err(AppError::InvalidInput(
            "Jira metadata must be a JSON object".into(),
        )),
        Err(err) => Err(AppError::InvalidInput(format!(
            "Jira metadata is not valid JSON: {err}"
        ))),
    }
}

/// Store the channel's ticket-filing configuration.
pub fn set_jira_project<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let project = JiraProject {
            project_key: ctx.arg(0).unwrap_or_default().trim().to_owned(),
            issue_type: ctx.arg(1).unwrap_or_default().trim().to_owned(),
            metadata: ctx.arg(2).map(normalize_metadata).transpose()?,
        };

        let update = SettingsUpdate {
            jira: Some(project),
            ..SettingsUpdate::default()
        };
        save(ctx, services, update).await?;
        reply_markdown(
            ctx,
            services,
            configured_reply("set-jira-project", "get-jira-project"),
        )
        .await
    })
}

/// Show the stored ticket-filing configuration.
pub fn get_jira_project<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let channel = target_channel(ctx, 0);
        let project = services
            .settings
            .get(&channel)
            .await?
            .and_then(|settings| settings.jira);

        let text = match project {
            Some(JiraProject {
                project_key,
                issue_type,
                metadata,
            }) => {
                let mut text = format!(
                    "The jira project for this channel is `{project_key}` with issue type `{issue_type}`"
                );
                if let Some(metadata) = metadata {
                    text.push_str(&format!("\nExtra fields: `{metadata}`"));
                }
                text
            }
            None => "No Settings Found. Please use `set-jira-project PROJECT_KEY ISSUE_TYPE` to configure"
                .into(),
        };
        reply_markdown(ctx, services, text).await
    })
}
