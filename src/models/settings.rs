//! Per-channel settings row.

use serde::{Deserialize, Serialize};

/// Ticket-filing configuration for one channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JiraProject {
    /// Project key, e.g. `OPS`.
    pub project_key: String,
    /// Issue type name, e.g. `Task`.
    pub issue_type: String,
    /// Extra ticket fields as a JSON object string.
    pub metadata: Option<String>,
}

/// Settings persisted for one channel.
///
/// A row is created by the first `set-*` command for a channel and is
/// updated in place afterwards; the bot never deletes rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Slack channel identifier (primary key).
    pub channel_id: String,
    /// Schedule, escalation-policy, or service URL.
    pub pagerduty_url: Option<String>,
    /// Tracking sheet reference for request logging.
    pub tracking_sheet: Option<String>,
    /// Channel display name cached on the last settings write.
    pub channel_name: Option<String>,
    /// Ticket-filing configuration.
    pub jira: Option<JiraProject>,
}

/// Partial update applied by [`crate::persistence::SettingsStore::upsert`].
///
/// `None` fields are left untouched on an existing row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    /// New schedule reference.
    pub pagerduty_url: Option<String>,
    /// New tracking sheet reference.
    pub tracking_sheet: Option<String>,
    /// Refreshed display name.
    pub channel_name: Option<String>,
    /// New ticket-filing configuration.
    pub jira: Option<JiraProject>,
}

impl SettingsUpdate {
    /// Attach the channel's current display name.
    #[must_use]
    pub fn with_channel_name(mut self, name: Option<String>) -> Self {
        self.channel_name = name;
        self
    }
}
