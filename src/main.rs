#![forbid(unsafe_code)]

//! `oncall-bot`: Slack mention bot binary.
//!
//! Loads configuration, opens the settings database, connects the
//! collaborators, and serves Socket Mode events until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use oncall_bot::command::{self, Dispatcher, Services};
use oncall_bot::jira::client::JiraClient;
use oncall_bot::jira::IssueTracker;
use oncall_bot::pagerduty::client::PagerDutyClient;
use oncall_bot::persistence::{db, settings_repo::SettingsRepo, tracking_repo::TrackingRepo};
use oncall_bot::slack::client::SlackService;
use oncall_bot::slack::events::EventRouter;
use oncall_bot::{AppError, BotConfig, Result};

/// Time given to the outgoing queue to flush after shutdown starts.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "oncall-bot", about = "Slack on-call mention bot", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("oncall-bot bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = BotConfig::load_from_path(&args.config)?;
    config.load_credentials().await?;
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.db_path).await?);
    info!(path = %config.db_path.display(), "database connected");

    // ── Collaborators ───────────────────────────────────
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;

    let (slack, slack_runtime) = SlackService::start(&config.slack, http.clone())?;
    let slack = Arc::new(slack);
    let self_id = slack.bot_user_id().await?;
    info!(%self_id, "slack identity resolved");

    let schedules = Arc::new(PagerDutyClient::new(&config.pagerduty, http.clone())?);
    let issues = config.jira.as_ref().map(|jira| {
        info!(base_url = %jira.base_url, cloud = jira.is_cloud(), "jira enabled");
        Arc::new(JiraClient::new(jira, http.clone())) as Arc<dyn IssueTracker>
    });

    let services = Services {
        messenger: slack.clone(),
        schedules,
        settings: Arc::new(SettingsRepo::new(Arc::clone(&db))),
        tracking: Arc::new(TrackingRepo::new(Arc::clone(&db))),
        issues,
    };
    let dispatcher = Arc::new(Dispatcher::new(command::build_registry(), services));

    // ── Serve ───────────────────────────────────────────
    let ct = CancellationToken::new();
    let router = Arc::new(EventRouter {
        dispatcher,
        self_id,
    });
    let socket_handle = slack.spawn_socket_mode(router, ct.clone());
    info!("oncall-bot ready");

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    if let Err(err) = socket_handle.await {
        error!(%err, "socket mode task failed");
    }
    tokio::time::sleep(DRAIN_GRACE).await;
    slack_runtime.queue_task.abort();
    db.close().await;
    info!("oncall-bot shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                if let Err(err) = ctrl_c.await {
                    tracing::error!(%err, "ctrl-c signal handler failed");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
