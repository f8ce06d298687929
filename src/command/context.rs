//! Inbound events and the per-invocation context handed to handlers.

use crate::slack::links;
use crate::slack::Reply;

/// How the messaging platform delivered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An explicit mention-type event; always addressed to the bot.
    AppMention,
    /// A plain message; addressed only when its text mentions the bot.
    Message,
}

/// A message event as received from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Delivery kind.
    pub kind: EventKind,
    /// Channel the message was posted in.
    pub channel: String,
    /// Author, absent for bot or system messages.
    pub user: Option<String>,
    /// Raw message text including mention markup.
    pub text: String,
    /// Timestamp of the message itself.
    pub ts: String,
    /// Root of the thread the message belongs to, if any.
    pub thread_ts: Option<String>,
}

impl InboundEvent {
    /// Whether this event is meant for the bot with user id `self_id`.
    #[must_use]
    pub fn is_addressed_to(&self, self_id: &str) -> bool {
        match self.kind {
            EventKind::AppMention => true,
            EventKind::Message => self.text.contains(&links::mention(self_id)),
        }
    }
}

/// Everything a handler knows about one invocation.
///
/// Built fresh per event and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Originating channel.
    pub channel: String,
    /// Timestamp of the triggering message.
    pub message_ts: String,
    /// Thread root; `None` when the mention starts a new thread.
    pub thread_ts: Option<String>,
    /// Lower-cased command token.
    pub command: String,
    /// Arguments after the command token.
    pub args: Vec<String>,
    /// Invoking user.
    pub user: Option<String>,
}

impl InvocationContext {
    /// Build the context for `event` with an already tokenized command line.
    #[must_use]
    pub fn from_event(event: &InboundEvent, command: String, args: Vec<String>) -> Self {
        Self {
            channel: event.channel.clone(),
            message_ts: event.ts.clone(),
            thread_ts: event.thread_ts.clone(),
            command,
            args,
            user: event.user.clone(),
        }
    }

    /// Timestamp replies are threaded under: the existing thread, or the
    /// triggering message when it is top-level.
    #[must_use]
    pub fn reply_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.message_ts)
    }

    /// Plain-text reply in this invocation's thread.
    #[must_use]
    pub fn reply(&self, text: impl Into<String>) -> Reply {
        Reply::plain(self.channel.clone(), Some(self.reply_ts().to_owned()), text)
    }

    /// Positional argument `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}
