//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` and are safe to
//! re-run on every start.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS oncall_info (
    channel_id      TEXT PRIMARY KEY NOT NULL,
    pagerduty_url   TEXT,
    channel_name    TEXT,
    tracking_sheet  TEXT,
    jira_project    TEXT,
    jira_issue_type TEXT,
    jira_metadata   TEXT
);

CREATE TABLE IF NOT EXISTS tracking_request (
    tracking_sheet  TEXT NOT NULL,
    slack_url       TEXT NOT NULL,
    requested_at    TEXT NOT NULL,
    completed_at    TEXT,
    requested_by    TEXT,
    requested_team  TEXT,
    subject         TEXT NOT NULL,
    request_content TEXT,
    PRIMARY KEY (tracking_sheet, slack_url)
);

CREATE INDEX IF NOT EXISTS idx_tracking_requested_at
    ON tracking_request(tracking_sheet, requested_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
