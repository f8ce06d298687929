//! `summary`: paging and request statistics over a date range.

use chrono::Utc;
use tracing::{info, warn};

use crate::command::{Dispatcher, InvocationContext};
use crate::dates::parse_date;
use crate::models::tracking::RequestSummary;
use crate::oncall::ScheduleReference;
use crate::pagerduty::PagingSummary;
use crate::slack::links::parse_channel_ref;
use crate::{AppError, BoxFuture};

/// Reply when neither a schedule nor a tracking sheet is configured.
pub const NOTHING_TO_SUMMARIZE_REPLY: &str =
    "Nothing to summarize: the channel has no pagerduty or tracking sheet configured.";

/// Render the markdown summary; sections without data are omitted.
#[must_use]
pub fn render_summary(paging: Option<&PagingSummary>, requests: Option<&RequestSummary>) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(paging) = paging {
        lines.push("*### Pagerduty Summary ###*".into());
        lines.push(format!("Total Pages: {}", paging.total_pages));
        lines.push(format!("Weekend Pages: {}", paging.weekend_pages));
        lines.push(format!("Out of Business Hour Pages: {}", paging.out_of_hours_pages));
        lines.push(String::new());
        lines.push("*#### Pages Count ####*:".into());
        lines.extend(
            paging
                .by_title
                .iter()
                .map(|(title, count)| format!("{title}: {count}")),
        );
        lines.push(String::new());
    }

    if let Some(requests) = requests {
        lines.push("*### Request Summary ###*".into());
        lines.push(format!("Total Requests: {}", requests.total_requests));
        lines.push(format!("Total PR Requests: {}", requests.code_review_requests));
        lines.push(format!("Total Support Requests: {}", requests.support_requests));
        lines.push(format!("Unresolved Requests: {}", requests.unresolved.len()));
        lines.push(String::new());
        lines.push("*#### Unresolved Requests ####*:".into());
        lines.extend(requests.unresolved.iter().map(|request| {
            format!(
                "<{}|{}> (from {})",
                request.slack_url,
                request.subject,
                request.requested_team.as_deref().unwrap_or("unknown")
            )
        }));
    }

    lines.join("\n").trim_end().to_owned()
}

/// Summarize pages and requests for `[channel] <start> <end>`.
pub fn summary<'a>(ctx: &'a InvocationContext, dispatcher: &'a Dispatcher) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let services = dispatcher.services();
        let (channel, start, end) = match ctx.args.as_slice() {
            [channel, start, end] => (parse_channel_ref(channel).id, start, end),
            [start, end] => (ctx.channel.clone(), start, end),
            _ => {
                return Err(AppError::InvalidInput(
                    "Expected [channel] <start_time> <end_time>".into(),
                ))
            }
        };

        let now = Utc::now();
        let start = parse_date(start, now)?;
        let end = parse_date(end, now)?;
        if start > end {
            return Err(AppError::InvalidInput(
                "The start time must be before the end time".into(),
            ));
        }
        info!(%channel, %start, %end, "building summary");

        let settings = services.settings.get(&channel).await?.unwrap_or_default();

        let paging = match settings.pagerduty_url.as_deref().map(ScheduleReference::parse) {
            Some(Some(reference)) => Some(
                services
                    .schedules
                    .paging_summary(&reference, start, end)
                    .await?,
            ),
            Some(None) => {
                warn!(%channel, "stored pagerduty url is not recognized; skipping pages");
                None
            }
            None => None,
        };

        let requests = match settings.tracking_sheet.as_deref() {
            Some(sheet) => Some(RequestSummary::from_requests(
                services.tracking.requests_between(sheet, start, end).await?,
            )),
            None => None,
        };

        let reply = if paging.is_none() && requests.is_none() {
            ctx.reply(NOTHING_TO_SUMMARIZE_REPLY)
        } else {
            ctx.reply(render_summary(paging.as_ref(), requests.as_ref()))
                .markdown()
                .broadcast()
        };
        services.messenger.post_reply(reply).await
    })
}
