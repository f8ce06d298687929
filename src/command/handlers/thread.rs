//! Thread bookkeeping: completion reactions and request logging.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{display_name, thread_root};
use crate::command::{Dispatcher, InvocationContext, Services};
use crate::models::tracking::{TrackingRequest, DEFAULT_SUBJECT};
use crate::slack::{ThreadMessage, COMPLETE_REACTION};
use crate::{BoxFuture, Result};

/// Reply when `log-request` runs in a channel without a tracking sheet.
pub const NO_TRACKING_SHEET_REPLY: &str = "No tracking sheet found";

/// Convert a Slack message timestamp (`seconds.micros`) to a UTC time.
#[must_use]
pub fn ts_to_datetime(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, micros) = ts.split_once('.').unwrap_or((ts, "0"));
    let secs: i64 = secs.parse().ok()?;
    let micros: u32 = micros.parse().ok()?;
    DateTime::from_timestamp(secs, micros.checked_mul(1_000)?)
}

async fn tracking_sheet(services: &Services, channel: &str) -> Result<Option<String>> {
    Ok(services
        .settings
        .get(channel)
        .await?
        .and_then(|settings| settings.tracking_sheet))
}

async fn update_completion(
    ctx: &InvocationContext,
    services: &Services,
    root: &ThreadMessage,
    completed_at: Option<DateTime<Utc>>,
) -> Result<bool> {
    let Some(sheet) = tracking_sheet(services, &ctx.channel).await? else {
        return Ok(false);
    };
    let url = services.messenger.permalink(&ctx.channel, &root.ts).await?;
    services
        .tracking
        .set_completed(&sheet, &url, completed_at)
        .await
}

/// Mirror a completion change into the tracking sheet, if one is
/// configured. Failures are logged and otherwise ignored.
async fn track_completion(
    ctx: &InvocationContext,
    services: &Services,
    root: &ThreadMessage,
    completed_at: Option<DateTime<Utc>>,
) {
    match update_completion(ctx, services, root, completed_at).await {
        Ok(true) => info!(channel = %ctx.channel, done = completed_at.is_some(), "request completion tracked"),
        Ok(false) => debug!(channel = %ctx.channel, "thread is not a tracked request"),
        Err(err) => warn!(channel = %ctx.channel, %err, "failed to track request completion"),
    }
}

/// React to the thread's first message with a check mark.
pub fn mark_complete<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let root = thread_root(ctx, services).await?;
        services
            .messenger
            .add_reaction(&ctx.channel, &root.ts, COMPLETE_REACTION)
            .await?;
        track_completion(ctx, services, &root, Some(Utc::now())).await;
        Ok(())
    })
}

/// Remove the check mark from the thread's first message.
pub fn unmark_complete<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let root = thread_root(ctx, services).await?;
        services
            .messenger
            .remove_reaction(&ctx.channel, &root.ts, COMPLETE_REACTION)
            .await?;
        track_completion(ctx, services, &root, None).await;
        Ok(())
    })
}

/// Log the thread's first message as a request in the channel's
/// tracking sheet and acknowledge with a check mark on the command.
pub fn log_request<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let Some(sheet) = tracking_sheet(services, &ctx.channel).await? else {
            return services
                .messenger
                .post_reply(ctx.reply(NO_TRACKING_SHEET_REPLY))
                .await;
        };

        let root = thread_root(ctx, services).await?;
        let slack_url = services.messenger.permalink(&ctx.channel, &root.ts).await?;
        let subject = if ctx.args.is_empty() {
            DEFAULT_SUBJECT.to_owned()
        } else {
            ctx.args.join(" ")
        };

        let request = TrackingRequest {
            tracking_sheet: sheet,
            slack_url,
            requested_at: ts_to_datetime(&root.ts).unwrap_or_else(Utc::now),
            completed_at: None,
            requested_by: root.user.clone(),
            requested_team: display_name(services, &ctx.channel).await,
            subject,
            request_content: root.text.clone(),
        };
        services.tracking.record(request).await?;

        services
            .messenger
            .add_reaction(&ctx.channel, &ctx.message_ts, COMPLETE_REACTION)
            .await
    })
}
