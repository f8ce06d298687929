//! Persistence layer: store traits and their `SQLite` implementations.

pub mod db;
pub mod schema;
pub mod settings_repo;
pub mod tracking_repo;

use chrono::{DateTime, Utc};

use crate::models::settings::{ChannelSettings, SettingsUpdate};
use crate::models::tracking::TrackingRequest;
use crate::BoxFuture;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;

/// Single-row-per-channel key/value settings store.
///
/// Absence is a value, not an error: `get` returns `Ok(None)` for a
/// channel that was never configured.
pub trait SettingsStore: Send + Sync {
    /// Fetch the settings row for `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the store cannot be read.
    fn get<'a>(&'a self, channel_id: &'a str) -> BoxFuture<'a, Option<ChannelSettings>>;

    /// Create or update the row for `channel_id`. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    fn upsert<'a>(&'a self, channel_id: &'a str, update: SettingsUpdate) -> BoxFuture<'a, ()>;
}

/// Request log keyed by tracking sheet and thread permalink.
pub trait TrackingStore: Send + Sync {
    /// Insert or refresh a request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    fn record(&self, request: TrackingRequest) -> BoxFuture<'_, ()>;

    /// Set or clear the completion time of a logged request.
    ///
    /// Resolves to `false` when no such request was logged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the write fails.
    fn set_completed<'a>(
        &'a self,
        tracking_sheet: &'a str,
        slack_url: &'a str,
        completed_at: Option<DateTime<Utc>>,
    ) -> BoxFuture<'a, bool>;

    /// Requests made within `[start, end]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    fn requests_between<'a>(
        &'a self,
        tracking_sheet: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'a, Vec<TrackingRequest>>;
}
