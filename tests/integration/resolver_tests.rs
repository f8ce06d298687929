//! Integration tests for the on-call source cascade.
//!
//! Validates:
//! - A configured reference short-circuits topic and bookmark scraping
//! - Topic URL, bookmark, and topic-marker fallbacks in order
//! - Escalation policies page only their first rule
//! - Exact replies for the not-configured and nobody-on-call outcomes

use oncall_bot::models::oncall::{EscalationPolicy, EscalationRule, EscalationTarget};
use oncall_bot::models::settings::SettingsUpdate;
use oncall_bot::oncall::resolver::{NOBODY_ON_CALL_REPLY, NOT_CONFIGURED_REPLY};
use oncall_bot::oncall::OnCallOutcome;

use super::test_helpers::{person, FakeMessenger, FakeSchedules, Harness, CHANNEL};

async fn configure(harness: &Harness, url: &str) {
    harness
        .settings
        .upsert(
            CHANNEL,
            &SettingsUpdate {
                pagerduty_url: Some(url.into()),
                ..SettingsUpdate::default()
            },
        )
        .await
        .expect("upsert settings");
}

async fn resolve(harness: &Harness) -> OnCallOutcome {
    harness
        .dispatcher
        .services()
        .resolver()
        .resolve(CHANNEL)
        .await
        .expect("resolve")
}

#[tokio::test]
async fn configured_schedule_never_reads_topic_or_bookmarks() {
    let messenger = FakeMessenger::default()
        .with_topic("rota https://acme.pagerduty.com/schedules#PTOPIC")
        .with_bookmark("https://go.test/?pagerduty_url=https://acme.pagerduty.com/schedules/PBOOK")
        .with_user("alice@acme.test", "U_ALICE");
    let schedules =
        FakeSchedules::default().with_on_call("PSCHED", vec![person("alice@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;
    configure(&harness, "https://acme.pagerduty.com/schedules#PSCHED").await;

    let outcome = resolve(&harness).await;

    assert_eq!(outcome, OnCallOutcome::Handles(vec!["U_ALICE".into()]));
    assert_eq!(harness.messenger.topic_calls(), 0);
    assert_eq!(harness.messenger.bookmark_calls(), 0);
    assert_eq!(harness.schedules.schedule_calls(), vec!["PSCHED".to_owned()]);
}

#[tokio::test]
async fn configured_reference_that_resolves_nobody_does_not_fall_through() {
    let messenger = FakeMessenger::default()
        .with_topic("rota https://acme.pagerduty.com/schedules#PTOPIC")
        .with_user("bob@acme.test", "U_BOB");
    let schedules = FakeSchedules::default()
        .with_on_call("PSTALE", Vec::new())
        .with_on_call("PTOPIC", vec![person("bob@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;
    configure(&harness, "https://acme.pagerduty.com/schedules#PSTALE").await;

    let outcome = resolve(&harness).await;

    assert_eq!(outcome, OnCallOutcome::NobodyOnCall);
    assert_eq!(outcome.reply_text(), NOBODY_ON_CALL_REPLY);
    assert_eq!(harness.schedules.schedule_calls(), vec!["PSTALE".to_owned()]);
    assert_eq!(harness.messenger.bookmark_calls(), 0);
}

#[tokio::test]
async fn topic_url_is_used_when_nothing_is_configured() {
    let messenger = FakeMessenger::default()
        .with_topic("Support rota: <https://acme.pagerduty.com/schedules/PTOPIC|schedule>")
        .with_user("carol@acme.test", "U_CAROL");
    let schedules =
        FakeSchedules::default().with_on_call("PTOPIC", vec![person("carol@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;

    let outcome = resolve(&harness).await;

    assert_eq!(outcome, OnCallOutcome::Handles(vec!["U_CAROL".into()]));
    assert_eq!(harness.messenger.topic_calls(), 1, "topic is fetched once");
    assert_eq!(harness.messenger.bookmark_calls(), 0);
}

#[tokio::test]
async fn marked_bookmarks_are_used_after_the_topic() {
    let messenger = FakeMessenger::default()
        .with_topic("no links here")
        .with_bookmark("https://acme.pagerduty.com/schedules#PIGNORED")
        .with_bookmark(
            "https://go.test/redirect?pagerduty_url=https%3A%2F%2Facme.pagerduty.com%2Fschedules%23PBOOK",
        )
        .with_user("dan@acme.test", "U_DAN");
    let schedules = FakeSchedules::default()
        .with_on_call("PBOOK", vec![person("dan@acme.test")])
        .with_on_call("PIGNORED", vec![person("dan@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;

    let outcome = resolve(&harness).await;

    assert_eq!(outcome, OnCallOutcome::Handles(vec!["U_DAN".into()]));
    assert_eq!(harness.schedules.schedule_calls(), vec!["PBOOK".to_owned()]);
}

#[tokio::test]
async fn escalation_policy_pages_only_its_first_rule() {
    let policy = EscalationPolicy {
        id: "PPOL".into(),
        escalation_rules: vec![
            EscalationRule {
                targets: vec![
                    EscalationTarget::schedule("PFIRST"),
                    EscalationTarget {
                        kind: "user_reference".into(),
                        id: "PUSER".into(),
                    },
                ],
            },
            EscalationRule {
                targets: vec![EscalationTarget::schedule("PBACKUP")],
            },
        ],
    };
    let messenger = FakeMessenger::default()
        .with_user("erin@acme.test", "U_ERIN")
        .with_user("frank@acme.test", "U_FRANK");
    let schedules = FakeSchedules::default()
        .with_policy(policy)
        .with_on_call("PFIRST", vec![person("erin@acme.test")])
        .with_on_call("PBACKUP", vec![person("frank@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;
    configure(&harness, "https://acme.pagerduty.com/escalation_policies#PPOL").await;

    let outcome = resolve(&harness).await;

    assert_eq!(outcome, OnCallOutcome::Handles(vec!["U_ERIN".into()]));
    assert_eq!(harness.schedules.schedule_calls(), vec!["PFIRST".to_owned()]);
}

#[tokio::test]
async fn handles_are_deduplicated_in_resolution_order() {
    let policy = EscalationPolicy {
        id: "PPOL".into(),
        escalation_rules: vec![EscalationRule {
            targets: vec![
                EscalationTarget::schedule("PA"),
                EscalationTarget::schedule("PB"),
            ],
        }],
    };
    let messenger = FakeMessenger::default()
        .with_user("gina@acme.test", "U_GINA")
        .with_user("hal@acme.test", "U_HAL");
    let schedules = FakeSchedules::default()
        .with_policy(policy)
        .with_on_call("PA", vec![person("gina@acme.test"), person("hal@acme.test")])
        .with_on_call("PB", vec![person("gina@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;
    configure(&harness, "https://acme.pagerduty.com/escalation_policies/PPOL").await;

    let outcome = resolve(&harness).await;

    assert_eq!(
        outcome,
        OnCallOutcome::Handles(vec!["U_GINA".into(), "U_HAL".into()])
    );
    assert_eq!(
        outcome.reply_text(),
        "<@U_GINA> <@U_HAL> please take a look on the request."
    );
}

#[tokio::test]
async fn service_resolves_through_its_escalation_policy() {
    let policy = EscalationPolicy {
        id: "PSVCPOL".into(),
        escalation_rules: vec![EscalationRule {
            targets: vec![EscalationTarget::schedule("PSVCSCHED")],
        }],
    };
    let messenger = FakeMessenger::default().with_user("ivy@acme.test", "U_IVY");
    let schedules = FakeSchedules::default()
        .with_service("PSVC", Some("PSVCPOL"))
        .with_policy(policy)
        .with_on_call("PSVCSCHED", vec![person("ivy@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;
    configure(&harness, "https://acme.pagerduty.com/service-directory/PSVC").await;

    assert_eq!(
        resolve(&harness).await,
        OnCallOutcome::Handles(vec!["U_IVY".into()])
    );
}

#[tokio::test]
async fn service_without_policy_resolves_nobody() {
    let schedules = FakeSchedules::default().with_service("PSVC", None);
    let harness = Harness::new(FakeMessenger::default(), schedules).await;
    configure(&harness, "https://acme.pagerduty.com/service-directory/PSVC").await;

    assert_eq!(resolve(&harness).await, OnCallOutcome::NobodyOnCall);
}

#[tokio::test]
async fn identities_without_slack_users_are_skipped() {
    let schedules =
        FakeSchedules::default().with_on_call("PSCHED", vec![person("ghost@acme.test")]);
    let harness = Harness::new(FakeMessenger::default(), schedules).await;
    configure(&harness, "https://acme.pagerduty.com/schedules#PSCHED").await;

    assert_eq!(resolve(&harness).await, OnCallOutcome::NobodyOnCall);
}

#[tokio::test]
async fn nothing_anywhere_is_not_configured() {
    let harness = Harness::new(FakeMessenger::default(), FakeSchedules::default()).await;

    let outcome = resolve(&harness).await;

    assert_eq!(outcome, OnCallOutcome::NotConfigured);
    assert_eq!(
        outcome.reply_text(),
        "Sorry, the channel doesn't have pagerduty id configured."
    );
    assert_eq!(outcome.reply_text(), NOT_CONFIGURED_REPLY);
}

#[tokio::test]
async fn topic_marker_is_the_last_resort() {
    let messenger = FakeMessenger::default().with_topic("Primary :pagerduty: <@U_MARKER|jo> this week");
    let harness = Harness::new(messenger, FakeSchedules::default()).await;

    let outcome = resolve(&harness).await;

    assert_eq!(outcome, OnCallOutcome::Handles(vec!["U_MARKER".into()]));
    assert_eq!(harness.messenger.topic_calls(), 1, "topic is fetched once");
}

#[tokio::test]
async fn topic_marker_rescues_an_empty_schedule() {
    let messenger = FakeMessenger::default().with_topic(":pagerduty: <@U_MARKER>");
    let schedules = FakeSchedules::default().with_on_call("PSCHED", Vec::new());
    let harness = Harness::new(messenger, schedules).await;
    configure(&harness, "https://acme.pagerduty.com/schedules#PSCHED").await;

    assert_eq!(
        resolve(&harness).await,
        OnCallOutcome::Handles(vec!["U_MARKER".into()])
    );
    assert_eq!(harness.messenger.bookmark_calls(), 0);
}

#[tokio::test]
async fn ping_command_resolves_the_named_channel() {
    let messenger = FakeMessenger::default().with_user("alice@acme.test", "U_ALICE");
    let schedules =
        FakeSchedules::default().with_on_call("PSCHED", vec![person("alice@acme.test")]);
    let harness = Harness::new(messenger, schedules).await;
    harness
        .settings
        .upsert(
            "C0THER",
            &SettingsUpdate {
                pagerduty_url: Some("https://acme.pagerduty.com/schedules#PSCHED".into()),
                ..SettingsUpdate::default()
            },
        )
        .await
        .expect("upsert settings");

    harness.mention("ping <#C0THER|team-other>").await;

    let reply = harness.messenger.single_reply();
    assert_eq!(reply.channel, CHANNEL);
    assert_eq!(reply.text, "<@U_ALICE> please take a look on the request.");
}

#[tokio::test]
async fn bare_mention_pings_the_current_channel() {
    let harness = Harness::new(FakeMessenger::default(), FakeSchedules::default()).await;

    harness.mention("").await;

    assert_eq!(harness.messenger.reply_texts(), vec![NOT_CONFIGURED_REPLY.to_owned()]);
}
