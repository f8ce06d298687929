//! Support request tracking repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::tracking::TrackingRequest;
use crate::{AppError, BoxFuture, Result};

use super::db::Database;
use super::TrackingStore;

/// Repository for `tracking_request` rows.
#[derive(Clone)]
pub struct TrackingRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct TrackingRow {
    tracking_sheet: String,
    slack_url: String,
    requested_at: String,
    completed_at: Option<String>,
    requested_by: Option<String>,
    requested_team: Option<String>,
    subject: String,
    request_content: Option<String>,
}

impl TrackingRow {
    fn into_request(self) -> Result<TrackingRequest> {
        let completed_at = self.completed_at.as_deref().map(parse_ts).transpose()?;
        Ok(TrackingRequest {
            requested_at: parse_ts(&self.requested_at)?,
            completed_at,
            tracking_sheet: self.tracking_sheet,
            slack_url: self.slack_url,
            requested_by: self.requested_by,
            requested_team: self.requested_team,
            subject: self.subject,
            request_content: self.request_content,
        })
    }
}

/// Fixed-width UTC form so that text comparison orders chronologically.
fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid timestamp {raw}: {e}")))
}

impl TrackingRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a request, or refresh the descriptive fields of one already
    /// logged for the same thread. Timestamps of an existing row are kept.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    pub async fn record(&self, request: &TrackingRequest) -> Result<()> {
        sqlx::query(
            "INSERT INTO tracking_request
                 (tracking_sheet, slack_url, requested_at, completed_at,
                  requested_by, requested_team, subject, request_content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(tracking_sheet, slack_url) DO UPDATE SET
                 requested_by    = excluded.requested_by,
                 requested_team  = excluded.requested_team,
                 subject         = excluded.subject,
                 request_content = excluded.request_content",
        )
        .bind(&request.tracking_sheet)
        .bind(&request.slack_url)
        .bind(ts(request.requested_at))
        .bind(request.completed_at.map(ts))
        .bind(&request.requested_by)
        .bind(&request.requested_team)
        .bind(&request.subject)
        .bind(&request.request_content)
        .execute(self.db.as_ref())
        .await?;
        Ok(())
    }

    /// Set or clear `completed_at`. Returns whether a row matched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn set_completed(
        &self,
        tracking_sheet: &str,
        slack_url: &str,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE tracking_request SET completed_at = ?1
             WHERE tracking_sheet = ?2 AND slack_url = ?3",
        )
        .bind(completed_at.map(ts))
        .bind(tracking_sheet)
        .bind(slack_url)
        .execute(self.db.as_ref())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch requests made within `[start, end]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails or a stored timestamp is
    /// malformed.
    pub async fn requests_between(
        &self,
        tracking_sheet: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TrackingRequest>> {
        let rows: Vec<TrackingRow> = sqlx::query_as(
            "SELECT tracking_sheet, slack_url, requested_at, completed_at,
                    requested_by, requested_team, subject, request_content
             FROM tracking_request
             WHERE tracking_sheet = ?1 AND requested_at >= ?2 AND requested_at <= ?3
             ORDER BY requested_at ASC",
        )
        .bind(tracking_sheet)
        .bind(ts(start))
        .bind(ts(end))
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(TrackingRow::into_request).collect()
    }
}

impl TrackingStore for TrackingRepo {
    fn record(&self, request: TrackingRequest) -> BoxFuture<'_, ()> {
        Box::pin(async move { TrackingRepo::record(self, &request).await })
    }

    fn set_completed<'a>(
        &'a self,
        tracking_sheet: &'a str,
        slack_url: &'a str,
        completed_at: Option<DateTime<Utc>>,
    ) -> BoxFuture<'a, bool> {
        Box::pin(TrackingRepo::set_completed(
            self,
            tracking_sheet,
            slack_url,
            completed_at,
        ))
    }

    fn requests_between<'a>(
        &'a self,
        tracking_sheet: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'a, Vec<TrackingRequest>> {
        Box::pin(TrackingRepo::requests_between(
            self,
            tracking_sheet,
            start,
            end,
        ))
    }
}
