use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use oncall_bot::models::tracking::{RequestSummary, TrackingRequest, CODE_REVIEW_SUBJECT};
use oncall_bot::persistence::{db, tracking_repo::TrackingRepo};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn request(sheet: &str, url: &str, requested_at: DateTime<Utc>, subject: &str) -> TrackingRequest {
    TrackingRequest {
        tracking_sheet: sheet.into(),
        slack_url: url.into(),
        requested_at,
        completed_at: None,
        requested_by: Some("U1".into()),
        requested_team: Some("#team".into()),
        subject: subject.into(),
        request_content: Some("help please".into()),
    }
}

async fn repo() -> TrackingRepo {
    let db = db::connect_memory().await.expect("db connect");
    TrackingRepo::new(Arc::new(db))
}

#[tokio::test]
async fn requests_between_filters_by_sheet_and_window() {
    let repo = repo().await;
    repo.record(&request("s1", "u1", at(3, 10), "Support"))
        .await
        .expect("record");
    repo.record(&request("s1", "u2", at(1, 10), CODE_REVIEW_SUBJECT))
        .await
        .expect("record");
    repo.record(&request("s1", "u3", at(20, 10), "Support"))
        .await
        .expect("record");
    repo.record(&request("s2", "u4", at(2, 10), "Support"))
        .await
        .expect("record");

    let found = repo
        .requests_between("s1", at(1, 0), at(10, 0))
        .await
        .expect("query");

    let urls: Vec<&str> = found.iter().map(|r| r.slack_url.as_str()).collect();
    assert_eq!(urls, vec!["u2", "u1"], "oldest first, other sheets excluded");
    assert_eq!(found[0].requested_at, at(1, 10));
}

#[tokio::test]
async fn record_refreshes_an_existing_row() {
    let repo = repo().await;
    repo.record(&request("s1", "u1", at(3, 10), "Support"))
        .await
        .expect("record");
    repo.set_completed("s1", "u1", Some(at(4, 9)))
        .await
        .expect("complete");
    repo.record(&request("s1", "u1", at(5, 10), CODE_REVIEW_SUBJECT))
        .await
        .expect("re-record");

    let found = repo
        .requests_between("s1", at(1, 0), at(30, 0))
        .await
        .expect("query");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].subject, CODE_REVIEW_SUBJECT);
    assert_eq!(found[0].requested_at, at(3, 10), "timestamps are kept");
    assert_eq!(found[0].completed_at, Some(at(4, 9)));
}

#[tokio::test]
async fn set_completed_reports_unknown_requests() {
    let repo = repo().await;
    repo.record(&request("s1", "u1", at(3, 10), "Support"))
        .await
        .expect("record");

    assert!(repo.set_completed("s1", "u1", Some(at(3, 12))).await.expect("set"));
    assert!(!repo.set_completed("s1", "missing", Some(at(3, 12))).await.expect("set"));
    assert!(repo.set_completed("s1", "u1", None).await.expect("clear"));

    let found = repo
        .requests_between("s1", at(1, 0), at(30, 0))
        .await
        .expect("query");
    assert_eq!(found[0].completed_at, None);
}

#[test]
fn request_summary_counts_subjects_and_unresolved() {
    let mut done = request("s1", "u1", at(1, 10), CODE_REVIEW_SUBJECT);
    done.completed_at = Some(at(1, 11));
    let summary = RequestSummary::from_requests(vec![
        done,
        request("s1", "u2", at(2, 10), "Support"),
        request("s1", "u3", at(3, 10), CODE_REVIEW_SUBJECT),
    ]);

    assert_eq!(summary.total_requests, 3);
    assert_eq!(summary.code_review_requests, 2);
    assert_eq!(summary.support_requests, 1);
    let unresolved: Vec<&str> = summary.unresolved.iter().map(|r| r.slack_url.as_str()).collect();
    assert_eq!(unresolved, vec!["u2", "u3"]);
}
