//! Issue-tracker collaborator and its Jira REST implementation.

pub mod client;

use serde_json::{Map, Value};

use crate::BoxFuture;

/// Characters with meaning in Jira wiki markup.
const MARKUP_CHARS: [char; 13] = ['*', '_', '{', '}', '[', ']', '(', ')', '|', '!', '^', '~', '?'];

/// A ticket to file.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRequest {
    /// Project key.
    pub project: String,
    /// One-line summary.
    pub summary: String,
    /// Body, already escaped where needed.
    pub description: String,
    /// Issue type name.
    pub issue_type: String,
    /// Extra fields merged into the create payload.
    pub metadata: Map<String, Value>,
}

/// Ticket filing and user lookup.
pub trait IssueTracker: Send + Sync {
    /// Mention handle for the tracker user registered under `email`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Jira` if the search fails.
    fn find_mention_handle<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Option<String>>;

    /// File `ticket` and return its browse URL.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Jira` if the ticket is rejected.
    fn create_ticket<'a>(&'a self, ticket: &'a TicketRequest) -> BoxFuture<'a, String>;
}

/// Backslash-escape Jira markup characters.
#[must_use]
pub fn escape_jira_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKUP_CHARS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Wiki-markup mention for a handle returned by
/// [`IssueTracker::find_mention_handle`].
#[must_use]
pub fn mention(handle: &str) -> String {
    format!("[~{handle}]")
}
