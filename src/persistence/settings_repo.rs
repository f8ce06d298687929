//! Channel settings repository for `SQLite` persistence.

use std::sync::Arc;

use tracing::info;

use crate::models::settings::{ChannelSettings, JiraProject, SettingsUpdate};
use crate::{BoxFuture, Result};

use super::db::Database;
use super::SettingsStore;

/// Repository for `oncall_info` rows.
#[derive(Clone)]
pub struct SettingsRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct SettingsRow {
    channel_id: String,
    pagerduty_url: Option<String>,
    channel_name: Option<String>,
    tracking_sheet: Option<String>,
    jira_project: Option<String>,
    jira_issue_type: Option<String>,
    jira_metadata: Option<String>,
}

impl SettingsRow {
    fn into_settings(self) -> ChannelSettings {
        let jira = match (self.jira_project, self.jira_issue_type) {
            (Some(project_key), Some(issue_type)) => Some(JiraProject {
                project_key,
                issue_type,
                metadata: self.jira_metadata,
            }),
            _ => None,
        };

        ChannelSettings {
            channel_id: self.channel_id,
            pagerduty_url: self.pagerduty_url,
            tracking_sheet: self.tracking_sheet,
            channel_name: self.channel_name,
            jira,
        }
    }
}

impl SettingsRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fetch the settings row for a channel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get(&self, channel_id: &str) -> Result<Option<ChannelSettings>> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT channel_id, pagerduty_url, channel_name, tracking_sheet,
                    jira_project, jira_issue_type, jira_metadata
             FROM oncall_info
             WHERE channel_id = ?1",
        )
        .bind(channel_id)
        .fetch_optional(self.db.as_ref())
        .await?;

        Ok(row.map(SettingsRow::into_settings))
    }

    /// Insert a row or update the provided fields of an existing one.
    ///
    /// The Jira triple is written as a unit: a new project replaces the
    /// stored metadata even when the new metadata is empty.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn upsert(&self, channel_id: &str, update: &SettingsUpdate) -> Result<()> {
        let (jira_project, jira_issue_type, jira_metadata) = match &update.jira {
            Some(jira) => (
                Some(jira.project_key.as_str()),
                Some(jira.issue_type.as_str()),
                jira.metadata.as_deref(),
            ),
            None => (None, None, None),
        };

        sqlx::query(
            "INSERT INTO oncall_info
                 (channel_id, pagerduty_url, channel_name, tracking_sheet,
                  jira_project, jira_issue_type, jira_metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(channel_id) DO UPDATE SET
                 pagerduty_url   = COALESCE(excluded.pagerduty_url, oncall_info.pagerduty_url),
                 channel_name    = COALESCE(excluded.channel_name, oncall_info.channel_name),
                 tracking_sheet  = COALESCE(excluded.tracking_sheet, oncall_info.tracking_sheet),
                 jira_metadata   = CASE WHEN excluded.jira_project IS NOT NULL
                                        THEN excluded.jira_metadata
                                        ELSE oncall_info.jira_metadata END,
                 jira_project    = COALESCE(excluded.jira_project, oncall_info.jira_project),
                 jira_issue_type = COALESCE(excluded.jira_issue_type, oncall_info.jira_issue_type)",
        )
        .bind(channel_id)
        .bind(update.pagerduty_url.as_deref())
        .bind(update.channel_name.as_deref())
        .bind(update.tracking_sheet.as_deref())
        .bind(jira_project)
        .bind(jira_issue_type)
        .bind(jira_metadata)
        .execute(self.db.as_ref())
        .await?;

        info!(channel_id, "channel settings upserted");
        Ok(())
    }
}

impl SettingsStore for SettingsRepo {
    fn get<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, Option<ChannelSettings>> {
        Box::pin(SettingsRepo::get(self, channel_id))
    }

    fn upsert<'a>(&'a self, channel_id: &'a str, update: SettingsUpdate) -> BoxFuture<'a, ()> {
        Box::pin(async move { SettingsRepo::upsert(self, channel_id, &update).await })
    }
}
