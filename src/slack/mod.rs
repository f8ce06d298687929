//! Slack bridge layer: the messaging collaborator and its Socket Mode
//! implementation.

pub mod blocks;
pub mod client;
pub mod events;
pub mod links;

use crate::BoxFuture;

/// Reaction used to mark a thread as complete.
pub const COMPLETE_REACTION: &str = "white_check_mark";

/// A threaded reply to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Target channel.
    pub channel: String,
    /// Thread to reply in; `None` posts at channel level.
    pub thread_ts: Option<String>,
    /// Message text.
    pub text: String,
    /// Render `text` as Slack markdown.
    pub markdown: bool,
    /// Also show the threaded reply in the channel.
    pub broadcast: bool,
}

impl Reply {
    /// Plain-text reply in a thread.
    pub fn plain(
        channel: impl Into<String>,
        thread_ts: Option<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            thread_ts,
            text: text.into(),
            markdown: false,
            broadcast: false,
        }
    }

    /// Render as markdown.
    #[must_use]
    pub fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }

    /// Broadcast the threaded reply to the channel.
    #[must_use]
    pub fn broadcast(mut self) -> Self {
        self.broadcast = true;
        self
    }
}

/// The first message of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    /// Message timestamp.
    pub ts: String,
    /// Author, absent for bot or system messages.
    pub user: Option<String>,
    /// Message text.
    pub text: Option<String>,
}

/// The subset of a Slack user profile the handlers need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Slack user id.
    pub id: String,
    /// Display name.
    pub display_name: Option<String>,
    /// Full name.
    pub real_name: Option<String>,
    /// Profile email, when the bot may read it.
    pub email: Option<String>,
    /// IANA time zone.
    pub time_zone: Option<String>,
}

/// A channel bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// Bookmark title.
    pub title: Option<String>,
    /// Bookmarked URL.
    pub link: String,
}

/// Messaging-platform operations used by the command handlers.
///
/// Implementations bound their own call latency and surface failures as
/// `AppError::Slack`.
pub trait Messenger: Send + Sync {
    /// Post a reply.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the reply cannot be delivered or queued.
    fn post_reply(&self, reply: Reply) -> BoxFuture<'_, ()>;

    /// Add a reaction to a message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the API call fails.
    fn add_reaction<'a>(&'a self, channel: &'a str, ts: &'a str, name: &'a str)
        -> BoxFuture<'a, ()>;

    /// Remove a reaction from a message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the API call fails.
    fn remove_reaction<'a>(
        &'a self,
        channel: &'a str,
        ts: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, ()>;

    /// First message of the thread rooted at `thread_ts`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the history cannot be read.
    fn thread_first_message<'a>(
        &'a self,
        channel: &'a str,
        thread_ts: &'a str,
    ) -> BoxFuture<'a, Option<ThreadMessage>>;

    /// Permanent link to a message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the API call fails.
    fn permalink<'a>(&'a self, channel: &'a str, ts: &'a str) -> BoxFuture<'a, String>;

    /// Slack user id registered for `email`, `None` when nobody matches.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` for failures other than "no such user".
    fn lookup_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Option<String>>;

    /// Channel topic text (empty when unset).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the channel cannot be read.
    fn channel_topic<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, String>;

    /// Channel display name, `#`-prefixed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the channel cannot be read.
    fn channel_display_name<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, String>;

    /// Channel bookmarks; unreadable bookmarks yield an empty list.
    ///
    /// # Errors
    ///
    /// Implementations may still fail on transport errors.
    fn bookmarks<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Vec<Bookmark>>;

    /// Profile of a Slack user.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the user cannot be read.
    fn user_info<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, UserProfile>;

    /// Join a public channel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the join fails.
    fn join_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, ()>;
}
