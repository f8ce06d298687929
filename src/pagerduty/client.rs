//! `PagerDuty` REST v2 client.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::summary::{Incident, PagingSummary};
use super::ScheduleProvider;
use crate::config::PagerDutyConfig;
use crate::models::oncall::{EscalationPolicy, OnCallIdentity};
use crate::oncall::reference::{ReferenceKind, ScheduleReference};
use crate::{AppError, BoxFuture, Result};

const ACCEPT_V2: &str = "application/vnd.pagerduty+json;version=2";
const PAGE_SIZE: usize = 100;
/// Upper bound on incident pages fetched for one summary.
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct ScheduleUsers {
    users: Vec<OnCallIdentity>,
}

#[derive(Debug, Deserialize)]
struct PolicyEnvelope {
    escalation_policy: EscalationPolicy,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Service {
    #[serde(default)]
    escalation_policy: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
struct ServiceEnvelope {
    service: Service,
}

#[derive(Debug, Deserialize)]
struct Schedule {
    #[serde(default)]
    escalation_policies: Vec<IdRef>,
}

#[derive(Debug, Deserialize)]
struct ScheduleEnvelope {
    schedule: Schedule,
}

#[derive(Debug, Deserialize)]
struct IncidentRecord {
    #[serde(default)]
    title: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    escalation_policy: Option<IdRef>,
}

#[derive(Debug, Deserialize)]
struct IncidentPage {
    incidents: Vec<IncidentRecord>,
    #[serde(default)]
    more: bool,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Token-authenticated `PagerDuty` API client.
pub struct PagerDutyClient {
    http: Client,
    api_base: String,
    token: String,
    offset: FixedOffset,
}

impl PagerDutyClient {
    /// Build a client sharing the process-wide HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the summary offset is out of range.
    pub fn new(config: &PagerDutyConfig, http: Client) -> Result<Self> {
        let offset = FixedOffset::east_opt(config.summary_utc_offset_hours * 3600).ok_or_else(
            || {
                AppError::Config(format!(
                    "invalid summary utc offset: {}",
                    config.summary_utc_offset_hours
                ))
            },
        )?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            token: config.token.clone(),
            offset,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{path}", self.api_base);
        debug!(%url, "pagerduty request");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Token token={}", self.token))
            .header(ACCEPT, ACCEPT_V2)
            .query(query)
            .send()
            .await
            .map_err(|err| AppError::PagerDuty(format!("request to {path} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::PagerDuty(format!(
                "{path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|err| AppError::PagerDuty(format!("invalid response from {path}: {err}")))
    }

    /// People on call for a schedule during a one-second window at now.
    async fn schedule_users(&self, schedule_id: &str) -> Result<Vec<OnCallIdentity>> {
        let since = Utc::now();
        let until = since + TimeDelta::seconds(1);
        let body: ScheduleUsers = self
            .get_json(
                &format!("/schedules/{schedule_id}/users"),
                &[("since", rfc3339(since)), ("until", rfc3339(until))],
            )
            .await?;
        Ok(body.users)
    }

    async fn policy(&self, policy_id: &str) -> Result<EscalationPolicy> {
        let body: PolicyEnvelope = self
            .get_json(&format!("/escalation_policies/{policy_id}"), &[])
            .await?;
        Ok(body.escalation_policy)
    }

    async fn service_policy(&self, service_id: &str) -> Result<Option<String>> {
        let body: ServiceEnvelope = self
            .get_json(&format!("/services/{service_id}"), &[])
            .await?;
        Ok(body.service.escalation_policy.map(|policy| policy.id))
    }

    /// Escalation policies whose incidents count toward `reference`.
    async fn policies_for(&self, reference: &ScheduleReference) -> Result<HashSet<String>> {
        Ok(match reference.kind {
            ReferenceKind::EscalationPolicy => HashSet::from([reference.id.clone()]),
            ReferenceKind::Service => self
                .service_policy(&reference.id)
                .await?
                .into_iter()
                .collect(),
            ReferenceKind::Schedule => {
                let body: ScheduleEnvelope = self
                    .get_json(&format!("/schedules/{}", reference.id), &[])
                    .await?;
                body.schedule
                    .escalation_policies
                    .into_iter()
                    .map(|policy| policy.id)
                    .collect()
            }
        })
    }

    async fn summary(
        &self,
        reference: &ScheduleReference,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PagingSummary> {
        let policies = self.policies_for(reference).await?;
        let mut incidents = Vec::new();

        for page in 0..MAX_PAGES {
            let body: IncidentPage = self
                .get_json(
                    "/incidents",
                    &[
                        ("since", rfc3339(start)),
                        ("until", rfc3339(end)),
                        ("limit", PAGE_SIZE.to_string()),
                        ("offset", (page * PAGE_SIZE).to_string()),
                    ],
                )
                .await?;

            incidents.extend(
                body.incidents
                    .into_iter()
                    .filter(|record| {
                        record
                            .escalation_policy
                            .as_ref()
                            .is_some_and(|policy| policies.contains(&policy.id))
                    })
                    .map(|record| Incident {
                        title: record.title,
                        created_at: record.created_at,
                    }),
            );

            if !body.more {
                break;
            }
        }

        info!(%reference, pages = incidents.len(), "paging summary computed");
        Ok(PagingSummary::from_incidents(&incidents, self.offset))
    }
}

impl ScheduleProvider for PagerDutyClient {
    fn on_call_for_schedule<'a>(
        &'a self,
        schedule_id: &'a str,
    ) -> BoxFuture<'a, Vec<OnCallIdentity>> {
        Box::pin(self.schedule_users(schedule_id))
    }

    fn escalation_policy<'a>(&'a self, policy_id: &'a str) -> BoxFuture<'a, EscalationPolicy> {
        Box::pin(self.policy(policy_id))
    }

    fn service_escalation_policy<'a>(
        &'a self,
        service_id: &'a str,
    ) -> BoxFuture<'a, Option<String>> {
        Box::pin(self.service_policy(service_id))
    }

    fn paging_summary<'a>(
        &'a self,
        reference: &'a ScheduleReference,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'a, PagingSummary> {
        Box::pin(self.summary(reference, start, end))
    }
}
