//! `ping` and the fallback command: page whoever is on call.

use tracing::info;

use crate::command::{Dispatcher, InvocationContext, Services};
use crate::slack::links::parse_channel_ref;
use crate::{BoxFuture, Result};

async fn ping_channel(ctx: &InvocationContext, services: &Services, channel: &str) -> Result<()> {
    let outcome = services.resolver().resolve(channel).await?;
    info!(channel, ?outcome, "on-call resolved");
    services
        .messenger
        .post_reply(ctx.reply(outcome.reply_text()))
        .await
}

/// Ping on-call for the channel given as the first argument.
pub fn ping<'a>(ctx: &'a InvocationContext, dispatcher: &'a Dispatcher) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let channel = parse_channel_ref(ctx.arg(0).unwrap_or_default()).id;
        ping_channel(ctx, dispatcher.services(), &channel).await
    })
}

/// Ping on-call for the channel the mention came from.
pub fn ping_current_channel<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(ping_channel(ctx, dispatcher.services(), &ctx.channel))
}
