//! Support request tracking records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subject that classifies a request as a code review.
pub const CODE_REVIEW_SUBJECT: &str = "Code Review";

/// Subject used when `log-request` is called without one.
pub const DEFAULT_SUBJECT: &str = "Support";

/// One support request logged against a tracking sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingRequest {
    /// Tracking sheet the request belongs to.
    pub tracking_sheet: String,
    /// Permalink of the thread's first message; unique per sheet.
    pub slack_url: String,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
    /// When the request was marked complete.
    pub completed_at: Option<DateTime<Utc>>,
    /// Slack user who asked.
    pub requested_by: Option<String>,
    /// Channel display name the request came from.
    pub requested_team: Option<String>,
    /// Short classification, e.g. `Code Review`.
    pub subject: String,
    /// Text of the original message.
    pub request_content: Option<String>,
}

/// Request counts over a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSummary {
    /// Every request in the window.
    pub total_requests: usize,
    /// Requests whose subject is [`CODE_REVIEW_SUBJECT`].
    pub code_review_requests: usize,
    /// Everything else.
    pub support_requests: usize,
    /// Requests without a completion time.
    pub unresolved: Vec<TrackingRequest>,
}

impl RequestSummary {
    /// Aggregate a window of requests.
    #[must_use]
    pub fn from_requests(requests: Vec<TrackingRequest>) -> Self {
        let total_requests = requests.len();
        let code_review_requests = requests
            .iter()
            .filter(|r| r.subject == CODE_REVIEW_SUBJECT)
            .count();
        let unresolved = requests
            .into_iter()
            .filter(|r| r.completed_at.is_none())
            .collect();

        Self {
            total_requests,
            code_review_requests,
            support_requests: total_requests - code_review_requests,
            unresolved,
        }
    }
}
