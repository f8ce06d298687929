use std::time::Duration;

use oncall_bot::{AppError, BotConfig};

fn sample_toml(db_path: &str) -> String {
    format!(
        r#"
db_path = '{db_path}'
http_timeout_seconds = 20

[slack]
api_base = "https://slack.test/api"

[pagerduty]
summary_utc_offset_hours = -7

[jira]
base_url = "https://acme.atlassian.net"
email = "bot@acme.test"
"#
    )
}

#[test]
fn parses_full_config() {
    let config = BotConfig::from_toml_str(&sample_toml("/tmp/oncall.db")).expect("config parses");

    assert_eq!(config.db_path.to_str(), Some("/tmp/oncall.db"));
    assert_eq!(config.http_timeout(), Duration::from_secs(20));
    assert_eq!(config.slack.api_base, "https://slack.test/api");
    assert_eq!(config.pagerduty.summary_utc_offset_hours, -7);
    assert_eq!(config.pagerduty.api_base, "https://api.pagerduty.com");

    let jira = config.jira.expect("jira section");
    assert!(jira.is_cloud());
    assert_eq!(jira.email.as_deref(), Some("bot@acme.test"));
    assert!(jira.token.is_empty(), "tokens never come from the file");
}

#[test]
fn minimal_config_uses_defaults() {
    let config = BotConfig::from_toml_str("db_path = 'oncall.db'").expect("config parses");

    assert_eq!(config.http_timeout_seconds, 15);
    assert_eq!(config.slack.api_base, "https://slack.com/api");
    assert_eq!(config.pagerduty.summary_utc_offset_hours, 0);
    assert!(config.jira.is_none());
}

#[test]
fn loads_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("config.toml");
    std::fs::write(&path, sample_toml("data/oncall.db")).expect("write config");

    let config = BotConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.db_path.to_str(), Some("data/oncall.db"));
}

#[test]
fn missing_file_is_a_config_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let result = BotConfig::load_from_path(temp.path().join("absent.toml"));
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn rejects_invalid_toml() {
    let result = BotConfig::from_toml_str("db_path = ");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn rejects_zero_timeout() {
    let result = BotConfig::from_toml_str("db_path = 'x.db'\nhttp_timeout_seconds = 0");
    match result {
        Err(AppError::Config(msg)) => assert!(msg.contains("http_timeout_seconds")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn rejects_out_of_range_offset() {
    let toml = "db_path = 'x.db'\n[pagerduty]\nsummary_utc_offset_hours = 20";
    assert!(matches!(
        BotConfig::from_toml_str(toml),
        Err(AppError::Config(_))
    ));
}

#[test]
fn cloud_jira_requires_an_email() {
    let toml = "db_path = 'x.db'\n[jira]\nbase_url = \"https://acme.atlassian.net/\"";
    match BotConfig::from_toml_str(toml) {
        Err(AppError::Config(msg)) => assert!(msg.contains("jira.email")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn server_jira_needs_no_email() {
    let toml = "db_path = 'x.db'\n[jira]\nbase_url = \"https://jira.acme.internal\"";
    let config = BotConfig::from_toml_str(toml).expect("config parses");
    assert!(!config.jira.expect("jira section").is_cloud());
}

#[test]
fn rejects_non_http_jira_url() {
    let toml = "db_path = 'x.db'\n[jira]\nbase_url = \"jira.acme.internal\"";
    assert!(matches!(
        BotConfig::from_toml_str(toml),
        Err(AppError::Config(_))
    ));
}
