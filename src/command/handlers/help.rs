//! `help`.

use crate::command::{Dispatcher, InvocationContext};
use crate::BoxFuture;

/// Reply with the rendered command list.
pub fn help<'a>(ctx: &'a InvocationContext, dispatcher: &'a Dispatcher) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        let text = dispatcher.registry().render_help();
        dispatcher
            .services()
            .messenger
            .post_reply(ctx.reply(text).markdown())
            .await
    })
}
