//! `join` and the hidden `channel-name` diagnostic.

use tracing::info;

use crate::command::{Dispatcher, InvocationContext};
use crate::slack::links::parse_channel_ref;
use crate::BoxFuture;

/// Join the channel given as the first argument.
pub fn join<'a>(ctx: &'a InvocationContext, dispatcher: &'a Dispatcher) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let messenger = &dispatcher.services().messenger;
        let channel = parse_channel_ref(ctx.arg(0).unwrap_or_default()).id;
        messenger.join_channel(&channel).await?;
        info!(%channel, "joined channel");
        messenger.post_reply(ctx.reply("joined channel")).await
    })
}

/// Reply with the display name of the channel given as the first argument.
pub fn channel_name<'a>(
    ctx: &'a InvocationContext,
    dispatcher: &'a Dispatcher,
) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let messenger = &dispatcher.services().messenger;
        let channel = parse_channel_ref(ctx.arg(0).unwrap_or_default()).id;
        let name = messenger.channel_display_name(&channel).await?;
        messenger.post_reply(ctx.reply(name)).await
    })
}
