//! Unit tests for mention tokenization.

use oncall_bot::command::tokenizer::{normalize_quotes, split_args, tokenize};
use oncall_bot::command::DEFAULT_COMMAND;

const BOT: &str = "UBOT";

#[test]
fn strips_the_mention_and_lowercases_the_command() {
    let tokens = tokenize("<@UBOT> Set-PagerDuty https://acme.pagerduty.com/schedules/P1", BOT);
    assert_eq!(tokens.command, "set-pagerduty");
    assert_eq!(tokens.args, vec!["https://acme.pagerduty.com/schedules/P1"]);
}

#[test]
fn arguments_keep_their_case() {
    let tokens = tokenize("<@UBOT> set-jira-project OPS Task", BOT);
    assert_eq!(tokens.args, vec!["OPS", "Task"]);
}

#[test]
fn quoted_arguments_stay_together() {
    let tokens = tokenize(
        "<@UBOT> create-ticket \"Disk full on db-1\" 'see <https://grafana.test/d/x|dashboard>'",
        BOT,
    );
    assert_eq!(tokens.command, "create-ticket");
    assert_eq!(
        tokens.args,
        vec![
            "Disk full on db-1",
            "see <https://grafana.test/d/x|dashboard>"
        ]
    );
}

#[test]
fn quoted_url_is_a_single_argument() {
    let tokens = tokenize(
        "<@UBOT> set-pagerduty \"<https://acme.pagerduty.com/schedules#P1|rota>\"",
        BOT,
    );
    assert_eq!(
        tokens.args,
        vec!["<https://acme.pagerduty.com/schedules#P1|rota>"]
    );
}

#[test]
fn unbalanced_quotes_fall_back_to_whitespace() {
    let tokens = tokenize("<@UBOT> foo \"bar", BOT);
    assert_eq!(tokens.command, "foo");
    assert_eq!(tokens.args, vec!["\"bar"]);
}

#[test]
fn hash_words_are_kept_as_arguments() {
    let tokens = tokenize("<@UBOT> log-request outage #incident-42 db", BOT);
    assert_eq!(tokens.command, "log-request");
    assert_eq!(tokens.args, vec!["outage", "#incident-42", "db"]);
}

#[test]
fn hash_arguments_count_toward_arity() {
    let tokens = tokenize("<@UBOT> create-ticket \"Disk full\" #123 details", BOT);
    assert_eq!(tokens.args, vec!["Disk full", "#123", "details"]);
}

#[test]
fn hashes_inside_quotes_and_channel_refs_survive() {
    assert_eq!(split_args("'# one' \"#two\""), vec!["# one", "#two"]);
    assert_eq!(split_args("<#C0THER|other> #"), vec!["<#C0THER|other>", "#"]);
    assert_eq!(split_args("already\\#escaped"), vec!["already#escaped"]);
}

#[test]
fn smart_quotes_are_normalized() {
    let tokens = tokenize("<@UBOT> log-request \u{201C}Code Review\u{201D}", BOT);
    assert_eq!(tokens.args, vec!["Code Review"]);
    assert_eq!(normalize_quotes("\u{2018}a\u{2019}"), "'a'");
}

#[test]
fn html_entities_are_unescaped() {
    let tokens = tokenize("<@UBOT> log-request a &amp; b", BOT);
    assert_eq!(tokens.args, vec!["a", "&", "b"]);
}

#[test]
fn empty_mention_selects_the_fallback() {
    let tokens = tokenize("<@UBOT>", BOT);
    assert_eq!(tokens.command, DEFAULT_COMMAND);
    assert!(tokens.args.is_empty());

    let whitespace = tokenize("  <@UBOT>   ", BOT);
    assert_eq!(whitespace.command, DEFAULT_COMMAND);
}

#[test]
fn mention_anywhere_in_the_text_is_removed() {
    let tokens = tokenize("help <@UBOT>", BOT);
    assert_eq!(tokens.command, "help");
    assert!(tokens.args.is_empty());
}

#[test]
fn other_mentions_are_kept_as_arguments() {
    let tokens = tokenize("<@UBOT> ping <@UOTHER>", BOT);
    assert_eq!(tokens.args, vec!["<@UOTHER>"]);
}

#[test]
fn split_args_handles_plain_words() {
    assert_eq!(split_args("a  b\tc"), vec!["a", "b", "c"]);
    assert!(split_args("").is_empty());
}
