//! On-call resolution for a channel.
//!
//! References are gathered from an ordered list of sources and the first
//! source that yields anything wins. Identities are then mapped to Slack
//! handles, with a hand-written topic marker as the last resort.

use std::sync::LazyLock;

use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::reference::{ReferenceKind, ScheduleReference};
use crate::models::oncall::OnCallIdentity;
use crate::pagerduty::ScheduleProvider;
use crate::persistence::SettingsStore;
use crate::slack::{links, Messenger};
use crate::Result;

#[allow(clippy::expect_used)] // Pattern is a compile-time literal.
static TOPIC_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://[^\s>|]*pagerduty\.com/[^\s>|]*").expect("topic url pattern compiles")
});

#[allow(clippy::expect_used)] // Pattern is a compile-time literal.
static TOPIC_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":pagerduty:\s*<@(?P<user>[^>|\s]+)(?:\|[^>]*)?>")
        .expect("topic mention pattern compiles")
});

/// Substring that marks a bookmark as a schedule link.
pub const BOOKMARK_MARKER: &str = "pagerduty_url";

/// Reply when no source names a schedule.
pub const NOT_CONFIGURED_REPLY: &str = "Sorry, the channel doesn't have pagerduty id configured.";

/// Reply when the schedule resolves to nobody.
pub const NOBODY_ON_CALL_REPLY: &str =
    "There are no oncall right now. Please ping on the time there's oncall. Thanks";

/// Where candidate references come from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSource {
    /// The channel's stored settings.
    Configured,
    /// A provider URL in the channel topic.
    TopicUrl,
    /// Channel bookmarks whose link carries [`BOOKMARK_MARKER`].
    Bookmarks,
}

/// Sources consulted by [`OnCallResolver::resolve`], in order.
pub const CASCADE: [ReferenceSource; 3] = [
    ReferenceSource::Configured,
    ReferenceSource::TopicUrl,
    ReferenceSource::Bookmarks,
];

/// Result of resolving a channel's on-call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnCallOutcome {
    /// Slack user ids to ping, de-duplicated in resolution order.
    Handles(Vec<String>),
    /// No source named a schedule and no topic marker was found.
    NotConfigured,
    /// A schedule was found but nobody is on call.
    NobodyOnCall,
}

impl OnCallOutcome {
    /// Chat reply for this outcome.
    #[must_use]
    pub fn reply_text(&self) -> String {
        match self {
            Self::Handles(handles) => {
                let pings: Vec<String> = handles.iter().map(|id| links::mention(id)).collect();
                format!("{} please take a look on the request.", pings.join(" "))
            }
            Self::NotConfigured => NOT_CONFIGURED_REPLY.to_owned(),
            Self::NobodyOnCall => NOBODY_ON_CALL_REPLY.to_owned(),
        }
    }
}

/// Extract the first provider URL from a channel topic.
#[must_use]
pub fn topic_url(topic: &str) -> Option<&str> {
    TOPIC_URL.find(topic).map(|m| m.as_str())
}

/// Extract the user named by a `:pagerduty: <@U…>` topic marker.
#[must_use]
pub fn topic_mention(topic: &str) -> Option<&str> {
    TOPIC_MENTION
        .captures(topic)
        .and_then(|caps| caps.name("user"))
        .map(|m| m.as_str())
}

/// Resolves who is on call for a channel.
pub struct OnCallResolver<'a> {
    settings: &'a dyn SettingsStore,
    messenger: &'a dyn Messenger,
    schedules: &'a dyn ScheduleProvider,
}

impl<'a> OnCallResolver<'a> {
    /// Borrow the collaborators for one resolution.
    #[must_use]
    pub fn new(
        settings: &'a dyn SettingsStore,
        messenger: &'a dyn Messenger,
        schedules: &'a dyn ScheduleProvider,
    ) -> Self {
        Self {
            settings,
            messenger,
            schedules,
        }
    }

    /// Resolve on-call handles for `channel`.
    ///
    /// A configured reference always wins, even if it resolves to nobody.
    ///
    /// # Errors
    ///
    /// Propagates store, messaging, and provider failures. Unrecognized
    /// references and empty escalation policies are logged and skipped.
    pub async fn resolve(&self, channel: &str) -> Result<OnCallOutcome> {
        let topic = OnceCell::new();

        let mut references = Vec::new();
        for source in CASCADE {
            references = self.references_from(source, channel, &topic).await?;
            if !references.is_empty() {
                debug!(?source, count = references.len(), "schedule references found");
                break;
            }
        }

        let mut identities = Vec::new();
        for reference in &references {
            identities.extend(self.identities_for(reference).await?);
        }

        let mut handles = self.handles_for(&identities).await?;
        if handles.is_empty() {
            let topic = self.topic(channel, &topic).await?;
            if let Some(user) = topic_mention(topic) {
                info!(channel, user, "using on-call marker from channel topic");
                handles.push(user.to_owned());
            }
        }

        Ok(match (handles.is_empty(), references.is_empty()) {
            (false, _) => OnCallOutcome::Handles(handles),
            (true, true) => OnCallOutcome::NotConfigured,
            (true, false) => OnCallOutcome::NobodyOnCall,
        })
    }

    async fn topic<'t>(&self, channel: &str, cache: &'t OnceCell<String>) -> Result<&'t str> {
        cache
            .get_or_try_init(|| self.messenger.channel_topic(channel))
            .await
            .map(String::as_str)
    }

    async fn references_from(
        &self,
        source: ReferenceSource,
        channel: &str,
        topic: &OnceCell<String>,
    ) -> Result<Vec<String>> {
        Ok(match source {
            ReferenceSource::Configured => self
                .settings
                .get(channel)
                .await?
                .and_then(|settings| settings.pagerduty_url)
                .filter(|url| !url.trim().is_empty())
                .into_iter()
                .collect(),
            ReferenceSource::TopicUrl => topic_url(self.topic(channel, topic).await?)
                .map(str::to_owned)
                .into_iter()
                .collect(),
            ReferenceSource::Bookmarks => self
                .messenger
                .bookmarks(channel)
                .await?
                .into_iter()
                .map(|bookmark| bookmark.link)
                .filter(|link| link.contains(BOOKMARK_MARKER))
                .collect(),
        })
    }

    async fn identities_for(&self, url: &str) -> Result<Vec<OnCallIdentity>> {
        let Some(reference) = ScheduleReference::parse(url) else {
            warn!(url, "unrecognized schedule reference; skipping");
            return Ok(Vec::new());
        };

        match reference.kind {
            ReferenceKind::Schedule => self.schedules.on_call_for_schedule(&reference.id).await,
            ReferenceKind::EscalationPolicy => self.policy_identities(&reference.id).await,
            ReferenceKind::Service => {
                match self
                    .schedules
                    .service_escalation_policy(&reference.id)
                    .await?
                {
                    Some(policy_id) => self.policy_identities(&policy_id).await,
                    None => {
                        warn!(service = %reference.id, "service has no escalation policy");
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    /// Only the first rule is paged; later tiers are backup.
    async fn policy_identities(&self, policy_id: &str) -> Result<Vec<OnCallIdentity>> {
        let policy = self.schedules.escalation_policy(policy_id).await?;
        let Some(first_rule) = policy.escalation_rules.first() else {
            warn!(policy = policy_id, "escalation policy has no rules");
            return Ok(Vec::new());
        };

        let mut identities = Vec::new();
        for target in first_rule.targets.iter().filter(|t| t.is_schedule()) {
            identities.extend(self.schedules.on_call_for_schedule(&target.id).await?);
        }
        Ok(identities)
    }

    async fn handles_for(&self, identities: &[OnCallIdentity]) -> Result<Vec<String>> {
        let mut handles: Vec<String> = Vec::new();
        for identity in identities {
            match self.messenger.lookup_user_by_email(&identity.email).await? {
                Some(user_id) if !handles.contains(&user_id) => handles.push(user_id),
                Some(_) => {}
                None => debug!(email = %identity.email, "no slack user for on-call email"),
            }
        }
        Ok(handles)
    }
}
