//! Paging history aggregation for the `summary` command.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// First hour counted as business hours (inclusive).
pub const BUSINESS_HOURS_START: u32 = 9;
/// First hour past business hours.
pub const BUSINESS_HOURS_END: u32 = 18;

/// An incident that paged someone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Incident {
    /// Incident title as shown in the provider.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts over a window of incidents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagingSummary {
    /// Every page in the window.
    pub total_pages: usize,
    /// Pages created on Saturday or Sunday.
    pub weekend_pages: usize,
    /// Weekday pages created outside business hours.
    pub out_of_hours_pages: usize,
    /// Page counts per incident title, most frequent first.
    pub by_title: Vec<(String, usize)>,
}

impl PagingSummary {
    /// Aggregate `incidents`, judging weekends and business hours in
    /// the time zone `offset`.
    #[must_use]
    pub fn from_incidents(incidents: &[Incident], offset: FixedOffset) -> Self {
        let mut summary = Self {
            total_pages: incidents.len(),
            ..Self::default()
        };
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for incident in incidents {
            let local = incident.created_at.with_timezone(&offset);
            if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
                summary.weekend_pages += 1;
            } else if !(BUSINESS_HOURS_START..BUSINESS_HOURS_END).contains(&local.hour()) {
                summary.out_of_hours_pages += 1;
            }
            *counts.entry(incident.title.as_str()).or_default() += 1;
        }

        let mut by_title: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(title, count)| (title.to_owned(), count))
            .collect();
        by_title.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        summary.by_title = by_title;
        summary
    }
}
