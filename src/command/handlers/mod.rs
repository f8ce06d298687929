//! Command handlers. Each function matches [`super::Handler`].

pub mod channel;
pub mod help;
pub mod oncall;
pub mod settings;
pub mod summary;
pub mod thread;
pub mod ticket;

use tracing::warn;

use super::{InvocationContext, Services};
use crate::slack::links::parse_channel_ref;
use crate::slack::ThreadMessage;
use crate::{AppError, Result};

/// Channel named by argument `index`, or the invoking channel when absent.
pub(crate) fn target_channel(ctx: &InvocationContext, index: usize) -> String {
    ctx.arg(index)
        .map_or_else(|| ctx.channel.clone(), |arg| parse_channel_ref(arg).id)
}

/// First message of the thread the command was issued in.
pub(crate) async fn thread_root(
    ctx: &InvocationContext,
    services: &Services,
) -> Result<ThreadMessage> {
    services
        .messenger
        .thread_first_message(&ctx.channel, ctx.reply_ts())
        .await?
        .ok_or_else(|| AppError::NotFound("Could not find the first message of this thread".into()))
}

/// Channel display name, or `None` when Slack cannot provide it.
pub(crate) async fn display_name(services: &Services, channel: &str) -> Option<String> {
    match services.messenger.channel_display_name(channel).await {
        Ok(name) => Some(name),
        Err(err) => {
            warn!(channel, %err, "could not read channel name");
            None
        }
    }
}
