//! Slack Socket Mode client with a small buffered send queue.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::{
    EmailAddress, SlackApiChatGetPermalinkRequest, SlackApiChatPostMessageRequest,
    SlackApiConversationsHistoryRequest, SlackApiConversationsInfoRequest,
    SlackApiConversationsJoinRequest, SlackApiReactionsAddRequest,
    SlackApiReactionsRemoveRequest, SlackApiToken, SlackApiTokenType, SlackApiTokenValue,
    SlackApiUsersInfoRequest, SlackApiUsersLookupByEmailRequest, SlackChannelId,
    SlackChannelInfo, SlackClient, SlackClientEventsListenerEnvironment,
    SlackClientHyperHttpsConnector, SlackClientSession, SlackClientSocketModeConfig,
    SlackClientSocketModeListener, SlackMessageContent, SlackReactionName,
    SlackSocketModeListenerCallbacks, SlackTs, SlackUserId,
};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{blocks, events, Bookmark, Messenger, Reply, ThreadMessage, UserProfile};
use crate::{config::SlackConfig, AppError, BoxFuture, Result};

const QUEUE_CAPACITY: usize = 256;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const MAX_SEND_ATTEMPTS: u32 = 5;

type SlackHyperClient = SlackClient<SlackClientHyperHttpsConnector>;

impl Reply {
    fn into_request(self) -> SlackApiChatPostMessageRequest {
        let content = if self.markdown {
            SlackMessageContent::new()
                .with_text(self.text.clone())
                .with_blocks(blocks::markdown_sections(&self.text))
        } else {
            SlackMessageContent::new().with_text(self.text)
        };

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(self.channel), content)
            .opt_thread_ts(self.thread_ts.map(SlackTs))
            .with_link_names(true);
        if self.broadcast {
            request.with_reply_broadcast(true)
        } else {
            request
        }
    }
}

/// Slack Web API wrapper that owns a rate-limited outgoing queue.
pub struct SlackService {
    client: Arc<SlackHyperClient>,
    bot_token: SlackApiToken,
    app_token: SlackApiToken,
    queue_tx: mpsc::Sender<Reply>,
    http: reqwest::Client,
    api_base: String,
}

/// Join handles for Slack background tasks.
pub struct SlackRuntime {
    /// Outgoing message worker.
    pub queue_task: JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
struct BookmarksResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    bookmarks: Vec<BookmarkEntry>,
}

#[derive(Debug, Deserialize)]
struct BookmarkEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: String,
}

fn token(value: &str, token_type: SlackApiTokenType) -> SlackApiToken {
    SlackApiToken {
        token_value: SlackApiTokenValue(value.to_owned()),
        cookie: None,
        team_id: None,
        scope: None,
        token_type: Some(token_type),
    }
}

fn is_api_error(err: &SlackClientError, code: &str) -> bool {
    matches!(err, SlackClientError::ApiError(api) if api.code == code)
}

impl SlackService {
    /// Create the Slack client and start the background sender task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn start(config: &SlackConfig, http: reqwest::Client) -> Result<(Self, SlackRuntime)> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = token(&config.bot_token, SlackApiTokenType::Bot);
        let app_token = token(&config.app_token, SlackApiTokenType::App);

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue_task = Self::spawn_worker(Arc::clone(&client), bot_token.clone(), queue_rx);

        info!("slack service started with buffered queue");

        Ok((
            Self {
                client,
                bot_token,
                app_token,
                queue_tx,
                http,
                api_base: config.api_base.trim_end_matches('/').to_owned(),
            },
            SlackRuntime { queue_task },
        ))
    }

    fn spawn_worker(
        client: Arc<SlackHyperClient>,
        token: SlackApiToken,
        mut queue_rx: mpsc::Receiver<Reply>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let session = client.open_session(&token);
            while let Some(reply) = queue_rx.recv().await {
                let channel = reply.channel.clone();
                let request = reply.into_request();
                let mut backoff = INITIAL_RETRY_DELAY;
                for attempt in 1..=MAX_SEND_ATTEMPTS {
                    match session.chat_post_message(&request).await {
                        Ok(_) => {
                            info!(%channel, "sent slack message");
                            break;
                        }
                        Err(error) if attempt == MAX_SEND_ATTEMPTS => {
                            error!(?error, %channel, attempt, "slack post failed; dropping message");
                        }
                        Err(error) => {
                            let delay = match &error {
                                SlackClientError::RateLimitError(rate) => {
                                    rate.retry_after.unwrap_or(backoff)
                                }
                                _ => backoff,
                            };
                            warn!(?error, delay = ?delay, attempt, "slack post failed; retrying");
                            sleep(delay).await;
                            backoff = (backoff * 2).min(MAX_RETRY_DELAY);
                        }
                    }
                }
            }
            info!("slack sender task exiting");
        })
    }

    /// Start the Socket Mode listener, routing push events to `router`
    /// until `shutdown` fires.
    #[must_use]
    pub fn spawn_socket_mode(
        &self,
        router: Arc<events::EventRouter>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let listener_env = Arc::new(
            SlackClientEventsListenerEnvironment::new(Arc::clone(&self.client))
                .with_error_handler(|err, _client, _state| {
                    error!(?err, "socket mode error");
                    axum::http::StatusCode::OK
                })
                .with_user_state(router),
        );
        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_hello_events(|event, _client, _state| async move {
                info!(?event, "socket hello");
            })
            .with_push_events(events::handle_push_event);
        let config = SlackClientSocketModeConfig {
            max_connections_count: SlackClientSocketModeConfig::DEFAULT_CONNECTIONS_COUNT,
            debug_connections: SlackClientSocketModeConfig::DEFAULT_DEBUG_CONNECTIONS,
            initial_backoff_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_INITIAL_BACKOFF_IN_SECONDS,
            reconnect_timeout_in_seconds:
                SlackClientSocketModeConfig::DEFAULT_RECONNECT_TIMEOUT_IN_SECONDS,
            ping_interval_in_seconds: SlackClientSocketModeConfig::DEFAULT_PING_INTERVAL_IN_SECONDS,
            ping_failure_threshold_times:
                SlackClientSocketModeConfig::DEFAULT_PING_FAILURE_THRESHOLD_TIMES,
        };

        let listener = SlackClientSocketModeListener::new(&config, listener_env, callbacks);
        let app_token = self.app_token.clone();
        tokio::spawn(async move {
            if let Err(error) = listener.listen_for(&app_token).await {
                error!(?error, "socket mode listen failed");
                return;
            }

            info!("socket mode connected");
            tokio::select! {
                exit_code = listener.serve() => {
                    info!(exit_code, "socket mode listener exited");
                }
                () = shutdown.cancelled() => {
                    info!("socket mode shutting down");
                    listener.shutdown().await;
                }
            }
        })
    }

    /// Create an HTTP session for direct API calls using the bot token.
    #[must_use]
    pub fn http_session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }

    /// Resolve the bot's own user id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if `auth.test` fails.
    pub async fn bot_user_id(&self) -> Result<String> {
        self.http_session()
            .auth_test()
            .await
            .map(|response| response.user_id.to_string())
            .map_err(|err| AppError::Slack(format!("auth.test failed: {err}")))
    }

    /// Enqueue a message for async delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the sender task has stopped.
    pub async fn enqueue(&self, reply: Reply) -> Result<()> {
        self.queue_tx
            .send(reply)
            .await
            .map_err(|err| AppError::Slack(format!("failed to enqueue slack message: {err}")))
    }

    async fn channel_info(&self, channel: &str) -> Result<SlackChannelInfo> {
        let request = SlackApiConversationsInfoRequest::new(SlackChannelId(channel.to_owned()));
        self.http_session()
            .conversations_info(&request)
            .await
            .map(|response| response.channel)
            .map_err(|err| AppError::Slack(format!("failed to read channel {channel}: {err}")))
    }

    async fn add_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<()> {
        let request = SlackApiReactionsAddRequest::new(
            SlackChannelId(channel.to_owned()),
            SlackReactionName(name.to_owned()),
            SlackTs(ts.to_owned()),
        );
        match self.http_session().reactions_add(&request).await {
            Ok(_) => Ok(()),
            Err(err) if is_api_error(&err, "already_reacted") => Ok(()),
            Err(err) => Err(AppError::Slack(format!("failed to add reaction: {err}"))),
        }
    }

    async fn remove_reaction(&self, channel: &str, ts: &str, name: &str) -> Result<()> {
        let request = SlackApiReactionsRemoveRequest::new(SlackReactionName(name.to_owned()))
            .with_channel(SlackChannelId(channel.to_owned()))
            .with_timestamp(SlackTs(ts.to_owned()));
        match self.http_session().reactions_remove(&request).await {
            Ok(_) => Ok(()),
            Err(err) if is_api_error(&err, "no_reaction") => Ok(()),
            Err(err) => Err(AppError::Slack(format!("failed to remove reaction: {err}"))),
        }
    }

    async fn thread_first_message(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Option<ThreadMessage>> {
        let request = SlackApiConversationsHistoryRequest::new()
            .with_channel(SlackChannelId(channel.to_owned()))
            .with_latest(SlackTs(thread_ts.to_owned()))
            .with_limit(1)
            .with_inclusive(true);

        let response = self
            .http_session()
            .conversations_history(&request)
            .await
            .map_err(|err| AppError::Slack(format!("failed to read history: {err}")))?;

        Ok(response.messages.into_iter().next().map(|message| ThreadMessage {
            ts: message.origin.ts.to_string(),
            user: message.sender.user.map(|u| u.to_string()),
            text: message.content.text,
        }))
    }

    async fn permalink(&self, channel: &str, ts: &str) -> Result<String> {
        let request = SlackApiChatGetPermalinkRequest::new(
            SlackChannelId(channel.to_owned()),
            SlackTs(ts.to_owned()),
        );
        self.http_session()
            .chat_get_permalink(&request)
            .await
            .map(|response| response.permalink.to_string())
            .map_err(|err| AppError::Slack(format!("failed to get permalink: {err}")))
    }

    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<String>> {
        let request = SlackApiUsersLookupByEmailRequest::new(EmailAddress(email.to_owned()));
        match self.http_session().users_lookup_by_email(&request).await {
            Ok(response) => Ok(Some(response.user.id.to_string())),
            Err(err) if is_api_error(&err, "users_not_found") => Ok(None),
            Err(err) => Err(AppError::Slack(format!("failed to look up {email}: {err}"))),
        }
    }

    async fn bookmarks(&self, channel: &str) -> Result<Vec<Bookmark>> {
        // bookmarks.list is not wrapped by slack-morphism.
        let response = self
            .http
            .post(format!("{}/bookmarks.list", self.api_base))
            .bearer_auth(&self.bot_token.token_value.0)
            .form(&[("channel_id", channel)])
            .send()
            .await
            .map_err(|err| AppError::Slack(format!("failed to list bookmarks: {err}")))?;
        let body: BookmarksResponse = response
            .json()
            .await
            .map_err(|err| AppError::Slack(format!("invalid bookmarks response: {err}")))?;

        if !body.ok {
            warn!(channel, error = ?body.error, "bookmarks.list rejected; treating as empty");
            return Ok(Vec::new());
        }

        Ok(body
            .bookmarks
            .into_iter()
            .map(|entry| Bookmark {
                title: entry.title,
                link: entry.link,
            })
            .collect())
    }

    async fn user_info(&self, user_id: &str) -> Result<UserProfile> {
        let request = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_owned()));
        let user = self
            .http_session()
            .users_info(&request)
            .await
            .map_err(|err| AppError::Slack(format!("failed to read user {user_id}: {err}")))?
            .user;

        let profile = user.profile.as_ref();
        Ok(UserProfile {
            id: user.id.to_string(),
            display_name: profile
                .and_then(|p| p.display_name.clone())
                .filter(|n| !n.is_empty()),
            real_name: profile.and_then(|p| p.real_name.clone()),
            email: profile.and_then(|p| p.email.as_ref().map(|e| e.0.clone())),
            time_zone: user.tz.clone(),
        })
    }

    async fn join_channel(&self, channel: &str) -> Result<()> {
        let request = SlackApiConversationsJoinRequest::new(SlackChannelId(channel.to_owned()));
        self.http_session()
            .conversations_join(&request)
            .await
            .map_err(|err| AppError::Slack(format!("failed to join {channel}: {err}")))?;
        Ok(())
    }
}

impl Messenger for SlackService {
    fn post_reply(&self, reply: Reply) -> BoxFuture<'_, ()> {
        Box::pin(self.enqueue(reply))
    }

    fn add_reaction<'a>(
        &'a self,
        channel: &'a str,
        ts: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, ()> {
        Box::pin(SlackService::add_reaction(self, channel, ts, name))
    }

    fn remove_reaction<'a>(
        &'a self,
        channel: &'a str,
        ts: &'a str,
        name: &'a str,
    ) -> BoxFuture<'a, ()> {
        Box::pin(SlackService::remove_reaction(self, channel, ts, name))
    }

    fn thread_first_message<'a>(
        &'a self,
        channel: &'a str,
        thread_ts: &'a str,
    ) -> BoxFuture<'a, Option<ThreadMessage>> {
        Box::pin(SlackService::thread_first_message(self, channel, thread_ts))
    }

    fn permalink<'a>(&'a self, channel: &'a str, ts: &'a str) -> BoxFuture<'a, String> {
        Box::pin(SlackService::permalink(self, channel, ts))
    }

    fn lookup_user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(SlackService::lookup_user_by_email(self, email))
    }

    fn channel_topic<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let info = self.channel_info(channel).await?;
            Ok(info.topic.map(|topic| topic.value).unwrap_or_default())
        })
    }

    fn channel_display_name<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, String> {
        Box::pin(async move {
            let info = self.channel_info(channel).await?;
            let name = info.name.unwrap_or_else(|| channel.to_owned());
            Ok(format!("#{}", name.trim_start_matches('#')))
        })
    }

    fn bookmarks<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, Vec<Bookmark>> {
        Box::pin(SlackService::bookmarks(self, channel))
    }

    fn user_info<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, UserProfile> {
        Box::pin(SlackService::user_info(self, user_id))
    }

    fn join_channel<'a>(&'a self, channel: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(SlackService::join_channel(self, channel))
    }
}
