//! Unit tests for the `summary` reply text.

use chrono::{TimeZone, Utc};

use oncall_bot::command::handlers::summary::render_summary;
use oncall_bot::models::tracking::{RequestSummary, TrackingRequest};
use oncall_bot::pagerduty::PagingSummary;

fn unresolved(url: &str, subject: &str, team: Option<&str>) -> TrackingRequest {
    TrackingRequest {
        tracking_sheet: "sheet".into(),
        slack_url: url.into(),
        requested_at: Utc
            .with_ymd_and_hms(2024, 6, 3, 10, 0, 0)
            .single()
            .expect("valid timestamp"),
        completed_at: None,
        requested_by: None,
        requested_team: team.map(str::to_owned),
        subject: subject.into(),
        request_content: None,
    }
}

#[test]
fn renders_both_sections() {
    let paging = PagingSummary {
        total_pages: 4,
        weekend_pages: 1,
        out_of_hours_pages: 2,
        by_title: vec![("Disk full".into(), 3), ("CPU high".into(), 1)],
    };
    let requests = RequestSummary {
        total_requests: 3,
        code_review_requests: 1,
        support_requests: 2,
        unresolved: vec![
            unresolved("https://slack.test/p1", "Support", Some("#infra")),
            unresolved("https://slack.test/p2", "Code Review", None),
        ],
    };

    let expected = "\
*### Pagerduty Summary ###*
Total Pages: 4
Weekend Pages: 1
Out of Business Hour Pages: 2

*#### Pages Count ####*:
Disk full: 3
CPU high: 1

*### Request Summary ###*
Total Requests: 3
Total PR Requests: 1
Total Support Requests: 2
Unresolved Requests: 2

*#### Unresolved Requests ####*:
<https://slack.test/p1|Support> (from #infra)
<https://slack.test/p2|Code Review> (from unknown)";

    assert_eq!(render_summary(Some(&paging), Some(&requests)), expected);
}

#[test]
fn omits_missing_sections() {
    let paging = PagingSummary {
        total_pages: 0,
        ..PagingSummary::default()
    };
    let text = render_summary(Some(&paging), None);
    assert!(text.starts_with("*### Pagerduty Summary ###*"));
    assert!(text.ends_with("*#### Pages Count ####*:"));
    assert!(!text.contains("Request Summary"));

    let text = render_summary(None, Some(&RequestSummary::default()));
    assert!(text.starts_with("*### Request Summary ###*"));
    assert!(!text.contains("Pagerduty"));
}
