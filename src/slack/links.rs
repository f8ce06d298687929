//! Parsing of Slack's inline markup: channel references, wrapped links,
//! mentions, and HTML entities.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)] // Pattern is a compile-time literal.
static CHANNEL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<#(?P<id>[^>|\s]+)(?:\|(?P<name>[^>]*))?>$").expect("valid channel pattern")
});

/// A channel argument resolved to its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    /// Channel id, e.g. `C0123ABC`.
    pub id: String,
    /// Channel name when Slack included one.
    pub name: Option<String>,
}

/// Resolve a channel argument.
///
/// Slack renders `#channel` as `<#C123|channel>` (or `<#C123>`). Anything
/// else is taken to be a raw channel id.
#[must_use]
pub fn parse_channel_ref(raw: &str) -> ChannelRef {
    let raw = raw.trim();
    match CHANNEL_REF.captures(raw) {
        Some(caps) => ChannelRef {
            id: caps["id"].to_owned(),
            name: caps
                .name("name")
                .map(|m| m.as_str().to_owned())
                .filter(|n| !n.is_empty()),
        },
        None => ChannelRef {
            id: raw.to_owned(),
            name: None,
        },
    }
}

/// Strip Slack's `<url>` / `<url|label>` wrapping from a link argument.
#[must_use]
pub fn unwrap_link(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('<').trim_end_matches('>');
    trimmed
        .split_once('|')
        .map_or(trimmed, |(url, _label)| url)
        .trim()
        .to_owned()
}

/// Render a user mention.
#[must_use]
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Undo the three entities Slack escapes in message text.
#[must_use]
pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
