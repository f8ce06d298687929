//! Jira REST v2 client for cloud and self-hosted instances.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{IssueTracker, TicketRequest};
use crate::config::JiraConfig;
use crate::{AppError, BoxFuture, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

/// Build the create-issue payload: the standard fields plus metadata,
/// with metadata never overriding the standard ones.
#[must_use]
pub fn issue_payload(ticket: &TicketRequest) -> Value {
    let mut fields = ticket.metadata.clone();
    fields.insert("project".into(), json!({ "key": ticket.project }));
    fields.insert("summary".into(), Value::String(ticket.summary.clone()));
    fields.insert("description".into(), Value::String(ticket.description.clone()));
    fields.insert("issuetype".into(), json!({ "name": ticket.issue_type }));
    json!({ "fields": fields })
}

/// Jira client. Cloud instances use basic auth and account ids; server
/// instances use a bearer token and user names.
pub struct JiraClient {
    http: Client,
    base_url: String,
    email: Option<String>,
    token: String,
    cloud: bool,
}

impl JiraClient {
    /// Build a client sharing the process-wide HTTP connection pool.
    #[must_use]
    pub fn new(config: &JiraConfig, http: Client) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            email: config.email.clone(),
            token: config.token.clone(),
            cloud: config.is_cloud(),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.email, self.cloud) {
            (Some(email), true) => request.basic_auth(email, Some(&self.token)),
            _ => request.bearer_auth(&self.token),
        }
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| AppError::Jira(format!("{what} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Jira(format!("{what} returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|err| AppError::Jira(format!("invalid {what} response: {err}")))
    }

    async fn search_user(&self, email: &str) -> Result<Option<String>> {
        let key = if self.cloud { "query" } else { "username" };
        let request = self
            .http
            .get(format!("{}/rest/api/2/user/search", self.base_url))
            .query(&[(key, email)]);
        let users: Vec<JiraUser> = self.send(request, "user search").await?;

        let handle = users.into_iter().next().and_then(|user| {
            user.account_id
                .map(|id| format!("accountid:{id}"))
                .or(user.name)
        });
        debug!(email, found = handle.is_some(), "jira user search");
        Ok(handle)
    }

    async fn create(&self, ticket: &TicketRequest) -> Result<String> {
        let request = self
            .http
            .post(format!("{}/rest/api/2/issue", self.base_url))
            .json(&issue_payload(ticket));
        let created: CreatedIssue = self.send(request, "issue create").await?;

        info!(project = %ticket.project, key = %created.key, "jira ticket created");
        Ok(format!("{}/browse/{}", self.base_url, created.key))
    }
}

impl IssueTracker for JiraClient {
    fn find_mention_handle<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(self.search_user(email))
    }

    fn create_ticket<'a>(&'a self, ticket: &'a TicketRequest) -> BoxFuture<'a, String> {
        Box::pin(self.create(ticket))
    }
}
