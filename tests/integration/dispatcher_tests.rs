//! Integration tests for event dispatch: addressing, validation,
//! fallback routing, error replies, and reply threading.

use oncall_bot::command::{EventKind, InboundEvent};
use oncall_bot::models::settings::{JiraProject, SettingsUpdate};
use oncall_bot::oncall::resolver::NOT_CONFIGURED_REPLY;

use super::test_helpers::{
    mention_event, FakeMessenger, FakeSchedules, Harness, BOT_ID, CHANNEL,
};

async fn harness() -> Harness {
    Harness::new(FakeMessenger::default(), FakeSchedules::default()).await
}

#[tokio::test]
async fn validator_failure_blocks_the_handler() {
    let harness = harness().await;

    harness.mention("set-pagerduty").await;

    assert_eq!(
        harness.messenger.reply_texts(),
        vec!["Too few arguments: expected at least 1, got 0.".to_owned()]
    );
    let stored = harness.settings.get(CHANNEL).await.expect("get settings");
    assert!(stored.is_none(), "handler must not run");
}

#[tokio::test]
async fn too_many_arguments_are_rejected() {
    let harness = harness().await;

    harness.mention("ping one two").await;

    assert_eq!(
        harness.messenger.reply_texts(),
        vec!["Too many arguments: expected at most 1, got 2.".to_owned()]
    );
    assert!(harness.schedules.schedule_calls().is_empty());
}

#[tokio::test]
async fn unknown_commands_fall_back_to_pinging_the_channel() {
    let harness = harness().await;

    harness.mention("can someone look at this?").await;

    assert_eq!(
        harness.messenger.reply_texts(),
        vec![NOT_CONFIGURED_REPLY.to_owned()]
    );
}

#[tokio::test]
async fn command_names_are_case_insensitive() {
    let harness = harness().await;

    harness.mention("HELP").await;

    let reply = harness.messenger.single_reply();
    assert!(reply.text.starts_with("Hi, I'm oncall bot"));
    assert!(reply.markdown);
}

#[tokio::test]
async fn help_lists_visible_commands_with_fallback_last() {
    let harness = harness().await;

    harness.mention("help").await;

    let text = harness.messenger.single_reply().text;
    assert!(text.contains(" - `set-pagerduty <pagerduty_url>`: configure pagerduty for this channel"));
    assert!(text.contains(" - `create-ticket <summary> <description>`"));
    assert!(!text.contains("channel-name"), "hidden commands stay out of help");
    let last = text.lines().last().expect("help has lines");
    assert_eq!(
        last,
        " - ``: if none of the command matched, we will ping the oncall person for the current channel"
    );
}

#[tokio::test]
async fn handler_errors_are_reported_in_thread() {
    let harness = harness().await;

    harness.mention("create-ticket \"Disk full\" \"db-1 is out of space\"").await;

    assert_eq!(
        harness.messenger.reply_texts(),
        vec!["Error: No Jira Project Configured".to_owned()]
    );
}

#[tokio::test]
async fn ticket_commands_need_a_configured_tracker() {
    let harness = harness().await;
    harness
        .settings
        .upsert(
            CHANNEL,
            &SettingsUpdate {
                jira: Some(JiraProject {
                    project_key: "OPS".into(),
                    issue_type: "Task".into(),
                    metadata: None,
                }),
                ..SettingsUpdate::default()
            },
        )
        .await
        .expect("upsert settings");

    harness.mention("create-ticket summary description").await;

    assert_eq!(
        harness.messenger.reply_texts(),
        vec!["Error: Jira is not configured for this bot".to_owned()]
    );
}

#[tokio::test]
async fn missing_thread_root_is_reported() {
    let harness = harness().await;

    harness.mention("mark-complete").await;

    assert_eq!(
        harness.messenger.reply_texts(),
        vec!["Error: Could not find the first message of this thread".to_owned()]
    );
    assert!(harness.messenger.reactions().is_empty());
}

#[tokio::test]
async fn unaddressed_messages_are_ignored() {
    let harness = harness().await;
    let event = InboundEvent {
        kind: EventKind::Message,
        channel: "D_DIRECT".into(),
        user: Some("U_ASKER".into()),
        text: "help".into(),
        ts: "1718200100.000200".into(),
        thread_ts: None,
    };

    harness.dispatcher.dispatch(BOT_ID, &event).await;

    assert!(harness.messenger.replies().is_empty());
}

#[tokio::test]
async fn messages_mentioning_the_bot_are_handled() {
    let harness = harness().await;
    let event = InboundEvent {
        kind: EventKind::Message,
        channel: "D_DIRECT".into(),
        user: Some("U_ASKER".into()),
        text: format!("<@{BOT_ID}> help"),
        ts: "1718200100.000200".into(),
        thread_ts: None,
    };

    harness.dispatcher.dispatch(BOT_ID, &event).await;

    let reply = harness.messenger.single_reply();
    assert_eq!(reply.channel, "D_DIRECT");
    assert!(reply.text.starts_with("Hi, I'm oncall bot"));
}

#[tokio::test]
async fn top_level_mentions_are_answered_in_a_new_thread() {
    let harness = harness().await;
    let event = mention_event("help", None);

    harness.dispatcher.dispatch(BOT_ID, &event).await;

    let reply = harness.messenger.single_reply();
    assert_eq!(reply.thread_ts.as_deref(), Some(event.ts.as_str()));
}

#[tokio::test]
async fn threaded_mentions_are_answered_in_their_thread() {
    let harness = harness().await;

    harness.mention_in_thread("help", "1718200000.000100").await;

    let reply = harness.messenger.single_reply();
    assert_eq!(reply.thread_ts.as_deref(), Some("1718200000.000100"));
}

#[tokio::test]
async fn join_uses_the_channel_reference() {
    let harness = harness().await;

    harness.mention("join <#C0NEW|new-team>").await;

    assert_eq!(
        harness.messenger.joined.lock().expect("lock").clone(),
        vec!["C0NEW".to_owned()]
    );
    assert_eq!(harness.messenger.reply_texts(), vec!["joined channel".to_owned()]);
}

#[tokio::test]
async fn hidden_channel_name_command_still_runs() {
    let harness = harness().await;

    harness.mention("channel-name <#C0NEW|new-team>").await;

    assert_eq!(harness.messenger.reply_texts(), vec!["#name-c0new".to_owned()]);
}
