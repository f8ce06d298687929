//! Turns raw mention text into a command name and shell-style arguments.

use tracing::debug;

use super::DEFAULT_COMMAND;
use crate::slack::links;

/// A tokenized command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenized {
    /// Lower-cased command token, or [`DEFAULT_COMMAND`] when the text was empty.
    pub command: String,
    /// Remaining tokens.
    pub args: Vec<String>,
}

/// Replace typographic quotes with their ASCII equivalents.
#[must_use]
pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            other => other,
        })
        .collect()
}

/// Escape every `#` outside quotes so the shell splitter keeps it as a
/// literal instead of starting a comment.
fn escape_hashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        match (quote, c) {
            _ if escaped => escaped = false,
            (None | Some('"'), '\\') => escaped = true,
            (None, '"' | '\'') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, '#') => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Split `text` with shell quoting rules, falling back to plain
/// whitespace splitting when the quoting is unbalanced.
#[must_use]
pub fn split_args(text: &str) -> Vec<String> {
    shell_words::split(&escape_hashes(text)).unwrap_or_else(|err| {
        debug!(%err, "unbalanced quoting, splitting on whitespace");
        text.split_whitespace().map(str::to_owned).collect()
    })
}

/// Tokenize a raw mention addressed to the bot with user id `self_id`.
#[must_use]
pub fn tokenize(raw: &str, self_id: &str) -> Tokenized {
    let stripped = raw.replace(&links::mention(self_id), "");
    let text = normalize_quotes(&links::unescape(stripped.trim()));
    let mut tokens = split_args(&text).into_iter();

    match tokens.next() {
        Some(first) => Tokenized {
            command: first.trim().to_lowercase(),
            args: tokens.collect(),
        },
        None => Tokenized {
            command: DEFAULT_COMMAND.to_owned(),
            args: Vec::new(),
        },
    }
}
