//! Socket Mode push-event handling: converts Slack events into
//! [`InboundEvent`]s and dispatches each on its own task.

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackAppMentionEvent, SlackClient, SlackClientEventsUserState,
    SlackClientHyperHttpsConnector, SlackEventCallbackBody, SlackMessageEvent,
    SlackPushEventCallback,
};
use tracing::{debug, warn};

use crate::command::{Dispatcher, EventKind, InboundEvent};

/// Shared state handed to the Socket Mode listener.
pub struct EventRouter {
    /// Command dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// The bot's own user id.
    pub self_id: String,
}

impl EventRouter {
    /// Dispatch `event` on a fresh task unless the bot wrote it.
    pub fn route(self: &Arc<Self>, event: InboundEvent) {
        if event.user.as_deref() == Some(self.self_id.as_str()) {
            debug!(channel = %event.channel, "ignoring own message");
            return;
        }

        let router = Arc::clone(self);
        tokio::spawn(async move {
            router.dispatcher.dispatch(&router.self_id, &event).await;
        });
    }
}

/// Convert an `app_mention` event.
#[must_use]
pub fn from_app_mention(event: SlackAppMentionEvent) -> InboundEvent {
    InboundEvent {
        kind: EventKind::AppMention,
        channel: event.channel.to_string(),
        user: Some(event.user.to_string()),
        text: event.content.text.unwrap_or_default(),
        ts: event.origin.ts.to_string(),
        thread_ts: event.origin.thread_ts.map(|ts| ts.to_string()),
    }
}

/// Convert a direct-message `message` event. Channel messages arrive as
/// `app_mention` as well, so only DMs are taken from here; edits, joins,
/// and other subtyped messages are skipped.
#[must_use]
pub fn from_message(event: SlackMessageEvent) -> Option<InboundEvent> {
    if event.subtype.is_some() {
        return None;
    }

    let channel = event.origin.channel?.to_string();
    let is_dm = event
        .origin
        .channel_type
        .as_ref()
        .map_or(channel.starts_with('D'), |kind| kind.0 == "im");
    if !is_dm {
        return None;
    }

    Some(InboundEvent {
        kind: EventKind::Message,
        channel,
        user: event.sender.user.map(|user| user.to_string()),
        text: event.content.and_then(|content| content.text)?,
        ts: event.origin.ts.to_string(),
        thread_ts: event.origin.thread_ts.map(|ts| ts.to_string()),
    })
}

/// Socket Mode push-event callback.
///
/// # Errors
///
/// Never fails; problems are logged.
pub async fn handle_push_event(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    state: SlackClientEventsUserState,
) -> slack_morphism::UserCallbackResult<()> {
    let router: Option<Arc<EventRouter>> = {
        let guard = state.read().await;
        guard.get_user_state::<Arc<EventRouter>>().cloned()
    };
    let Some(router) = router else {
        warn!("event router not available; dropping event");
        return Ok(());
    };

    let inbound = match event.event {
        SlackEventCallbackBody::AppMention(mention) => Some(from_app_mention(mention)),
        SlackEventCallbackBody::Message(message) => from_message(message),
        other => {
            debug!(?other, "ignoring push event");
            None
        }
    };

    if let Some(inbound) = inbound {
        router.route(inbound);
    }
    Ok(())
}
