//! Routes an inbound event through tokenizer, registry, validator, and
//! handler, reporting every outcome back to the originating thread.

use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::context::{InboundEvent, InvocationContext};
use super::registry::CommandRegistry;
use super::tokenizer::tokenize;
use super::Services;
use crate::slack::Reply;

/// Owns the command table and the collaborators handlers run against.
///
/// Built once at startup and shared across event tasks behind an `Arc`.
pub struct Dispatcher {
    registry: CommandRegistry,
    services: Services,
}

impl Dispatcher {
    /// Create a dispatcher over a fully populated registry.
    #[must_use]
    pub fn new(registry: CommandRegistry, services: Services) -> Self {
        Self { registry, services }
    }

    /// Command table.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Collaborators available to handlers.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Handle one inbound event on behalf of the bot user `self_id`.
    ///
    /// Never fails: validation messages and handler errors become replies.
    pub async fn dispatch(&self, self_id: &str, event: &InboundEvent) {
        if !event.is_addressed_to(self_id) {
            debug!(channel = %event.channel, "event not addressed to bot; ignoring");
            return;
        }

        let tokens = tokenize(&event.text, self_id);
        let ctx = InvocationContext::from_event(event, tokens.command, tokens.args);
        let span = info_span!(
            "dispatch",
            invocation_id = %Uuid::new_v4(),
            channel = %ctx.channel,
            command = %ctx.command,
        );
        self.invoke(&ctx).instrument(span).await;
    }

    /// Run the descriptor matching `ctx.command` (or the fallback).
    pub async fn invoke(&self, ctx: &InvocationContext) {
        let descriptor = self.registry.lookup(&ctx.command);

        if let Some(message) = descriptor.validate(&ctx.args) {
            info!(handler = descriptor.name(), reason = %message, "argument validation failed");
            self.send(ctx.reply(message)).await;
            return;
        }

        info!(handler = descriptor.name(), args = ctx.args.len(), "invoking handler");
        if let Err(err) = (descriptor.handler())(ctx, self).await {
            error!(handler = descriptor.name(), %err, "command failed");
            self.send(ctx.reply(format!("Error: {}", err.user_message())))
                .await;
        }
    }

    async fn send(&self, reply: Reply) {
        if let Err(err) = self.services.messenger.post_reply(reply).await {
            error!(%err, "failed to deliver reply");
        }
    }
}
